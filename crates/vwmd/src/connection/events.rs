//! Event encoding onto the outgoing queue.
//!
//! Events are encoded against the same compiled plans used for decoding and
//! appended to the connection's outgoing queue together with any descriptor
//! arguments; nothing touches the socket until the driver flushes.

use std::os::fd::OwnedFd;

use tracing::trace;
use vwm_protocol::schema::{
    buffer, callback, display, keyboard, linux_buffer_params, linux_dmabuf, output, registry as wl_registry,
    seat, shm, toplevel, wm_base, xdg_surface,
};
use vwm_protocol::{ArgValue, Interface, ObjectId, encode_event, registry};

use super::errors::ProtocolError;
use super::{CONNECTION_TARGET, Client};
use crate::globals::{Global, OutputInfo};

impl Client {
    /// Encodes an event from `sender` and queues it.
    ///
    /// Destructor events retire `sender` once queued.
    pub fn post_event(
        &mut self,
        sender: ObjectId,
        interface: Interface,
        opcode: u16,
        args: Vec<ArgValue>,
    ) -> Result<(), ProtocolError> {
        let Some(message) = registry().event(interface, opcode) else {
            return Err(ProtocolError::EventEncoding {
                interface,
                opcode,
                source: None,
            });
        };
        let encoded =
            encode_event(sender, message, args).map_err(|source| ProtocolError::EventEncoding {
                interface,
                opcode,
                source: Some(source),
            })?;
        trace!(
            target: CONNECTION_TARGET,
            client = %self.id(),
            object = %sender,
            ?interface,
            event = message.name(),
            bytes = encoded.bytes.len(),
            fds = encoded.fds.len(),
            "queued event"
        );
        self.outgoing.push(encoded);
        if message.is_destructor() {
            self.retire(sender)?;
        }
        Ok(())
    }

    /// Empties the slot of a destroyed object and tells the client its id
    /// may be reused.
    pub fn retire(&mut self, id: ObjectId) -> Result<(), ProtocolError> {
        self.objects.delete(id)?;
        self.post_event(
            ObjectId::DISPLAY,
            Interface::Display,
            display::event::DELETE_ID,
            vec![ArgValue::Uint(id.get())],
        )
    }

    pub fn display_error(&mut self, object: ObjectId, code: u32, message: &str) -> Result<(), ProtocolError> {
        self.post_event(
            ObjectId::DISPLAY,
            Interface::Display,
            display::event::ERROR,
            vec![
                ArgValue::Object(Some(object)),
                ArgValue::Uint(code),
                ArgValue::String(Some(message.to_owned())),
            ],
        )
    }

    pub fn registry_global(&mut self, registry: ObjectId, global: &Global) -> Result<(), ProtocolError> {
        self.post_event(
            registry,
            Interface::Registry,
            wl_registry::event::GLOBAL,
            vec![
                ArgValue::Uint(global.name),
                ArgValue::String(Some(global.interface.name().to_owned())),
                ArgValue::Uint(global.version),
            ],
        )
    }

    pub fn callback_done(&mut self, callback: ObjectId, data: u32) -> Result<(), ProtocolError> {
        self.post_event(
            callback,
            Interface::Callback,
            callback::event::DONE,
            vec![ArgValue::Uint(data)],
        )
    }

    pub fn shm_format(&mut self, shm: ObjectId, format: u32) -> Result<(), ProtocolError> {
        self.post_event(shm, Interface::Shm, shm::event::FORMAT, vec![ArgValue::Uint(format)])
    }

    pub fn buffer_release(&mut self, buffer: ObjectId) -> Result<(), ProtocolError> {
        self.post_event(buffer, Interface::Buffer, buffer::event::RELEASE, Vec::new())
    }

    pub fn seat_capabilities(&mut self, seat: ObjectId, capabilities: u32) -> Result<(), ProtocolError> {
        self.post_event(
            seat,
            Interface::Seat,
            seat::event::CAPABILITIES,
            vec![ArgValue::Uint(capabilities)],
        )
    }

    pub fn seat_name(&mut self, seat: ObjectId, name: &str) -> Result<(), ProtocolError> {
        self.post_event(
            seat,
            Interface::Seat,
            seat::event::NAME,
            vec![ArgValue::String(Some(name.to_owned()))],
        )
    }

    pub fn keyboard_keymap(&mut self, keyboard: ObjectId, fd: OwnedFd, size: u32) -> Result<(), ProtocolError> {
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::KEYMAP,
            vec![
                ArgValue::Uint(keyboard::keymap_format::XKB_V1),
                ArgValue::Fd(fd),
                ArgValue::Uint(size),
            ],
        )
    }

    pub fn keyboard_enter(&mut self, keyboard: ObjectId, surface: ObjectId) -> Result<(), ProtocolError> {
        let serial = self.next_serial();
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::ENTER,
            vec![
                ArgValue::Uint(serial),
                ArgValue::Object(Some(surface)),
                ArgValue::Array(Vec::new()),
            ],
        )
    }

    pub fn keyboard_leave(&mut self, keyboard: ObjectId, surface: ObjectId) -> Result<(), ProtocolError> {
        let serial = self.next_serial();
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::LEAVE,
            vec![ArgValue::Uint(serial), ArgValue::Object(Some(surface))],
        )
    }

    pub fn keyboard_key(&mut self, keyboard: ObjectId, time: u32, key: u32, pressed: bool) -> Result<(), ProtocolError> {
        let serial = self.next_serial();
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::KEY,
            vec![
                ArgValue::Uint(serial),
                ArgValue::Uint(time),
                ArgValue::Uint(key),
                ArgValue::Uint(u32::from(pressed)),
            ],
        )
    }

    pub fn keyboard_modifiers(&mut self, keyboard: ObjectId) -> Result<(), ProtocolError> {
        let serial = self.next_serial();
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::MODIFIERS,
            vec![
                ArgValue::Uint(serial),
                ArgValue::Uint(0),
                ArgValue::Uint(0),
                ArgValue::Uint(0),
                ArgValue::Uint(0),
            ],
        )
    }

    pub fn keyboard_repeat_info(&mut self, keyboard: ObjectId, rate: i32, delay: i32) -> Result<(), ProtocolError> {
        self.post_event(
            keyboard,
            Interface::Keyboard,
            keyboard::event::REPEAT_INFO,
            vec![ArgValue::Int(rate), ArgValue::Int(delay)],
        )
    }

    /// Sends geometry and mode, then scale and done where the bound version
    /// has them.
    pub fn output_description(&mut self, output: ObjectId, info: &OutputInfo, version: u32) -> Result<(), ProtocolError> {
        self.post_event(
            output,
            Interface::Output,
            output::event::GEOMETRY,
            vec![
                ArgValue::Int(0),
                ArgValue::Int(0),
                ArgValue::Int(0),
                ArgValue::Int(0),
                ArgValue::Int(0),
                ArgValue::String(Some(info.make.clone())),
                ArgValue::String(Some(info.model.clone())),
                ArgValue::Int(0),
            ],
        )?;
        self.post_event(
            output,
            Interface::Output,
            output::event::MODE,
            vec![
                ArgValue::Uint(output::mode::CURRENT | output::mode::PREFERRED),
                ArgValue::Int(info.width),
                ArgValue::Int(info.height),
                ArgValue::Int(info.refresh_mhz),
            ],
        )?;
        if version >= 2 {
            self.post_event(output, Interface::Output, output::event::SCALE, vec![ArgValue::Int(1)])?;
            self.post_event(output, Interface::Output, output::event::DONE, Vec::new())?;
        }
        Ok(())
    }

    pub fn wm_base_ping(&mut self, wm_base: ObjectId) -> Result<u32, ProtocolError> {
        let serial = self.next_serial();
        self.post_event(
            wm_base,
            Interface::WmBase,
            wm_base::event::PING,
            vec![ArgValue::Uint(serial)],
        )?;
        Ok(serial)
    }

    pub fn xdg_surface_configure(&mut self, xdg_surface: ObjectId, serial: u32) -> Result<(), ProtocolError> {
        self.post_event(
            xdg_surface,
            Interface::XdgSurface,
            xdg_surface::event::CONFIGURE,
            vec![ArgValue::Uint(serial)],
        )
    }

    /// `states` are `xdg_toplevel.state` values, sent as a packed u32 array.
    pub fn toplevel_configure(
        &mut self,
        toplevel: ObjectId,
        width: i32,
        height: i32,
        states: &[u32],
    ) -> Result<(), ProtocolError> {
        let packed = states.iter().flat_map(|state| state.to_le_bytes()).collect();
        self.post_event(
            toplevel,
            Interface::Toplevel,
            toplevel::event::CONFIGURE,
            vec![ArgValue::Int(width), ArgValue::Int(height), ArgValue::Array(packed)],
        )
    }

    pub fn dmabuf_format(&mut self, dmabuf: ObjectId, format: u32) -> Result<(), ProtocolError> {
        self.post_event(
            dmabuf,
            Interface::LinuxDmabuf,
            linux_dmabuf::event::FORMAT,
            vec![ArgValue::Uint(format)],
        )
    }

    pub fn dmabuf_modifier(&mut self, dmabuf: ObjectId, format: u32, modifier: u64) -> Result<(), ProtocolError> {
        let [hi, lo] = split_modifier(modifier);
        self.post_event(
            dmabuf,
            Interface::LinuxDmabuf,
            linux_dmabuf::event::MODIFIER,
            vec![ArgValue::Uint(format), ArgValue::Uint(hi), ArgValue::Uint(lo)],
        )
    }

    pub fn params_created(&mut self, params: ObjectId, buffer: ObjectId) -> Result<(), ProtocolError> {
        self.post_event(
            params,
            Interface::LinuxBufferParams,
            linux_buffer_params::event::CREATED,
            vec![ArgValue::NewId(buffer)],
        )
    }

    pub fn params_failed(&mut self, params: ObjectId) -> Result<(), ProtocolError> {
        self.post_event(
            params,
            Interface::LinuxBufferParams,
            linux_buffer_params::event::FAILED,
            Vec::new(),
        )
    }
}

/// Splits a 64-bit format modifier into its `(hi, lo)` wire words.
const fn split_modifier(modifier: u64) -> [u32; 2] {
    let [h0, h1, h2, h3, l0, l1, l2, l3] = modifier.to_be_bytes();
    [
        u32::from_be_bytes([h0, h1, h2, h3]),
        u32::from_be_bytes([l0, l1, l2, l3]),
    ]
}
