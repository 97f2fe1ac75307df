//! `wl_seat` and its devices, plus keyboard focus within a client.
//!
//! The seat decides which client holds focus; within that client, keyboards
//! enter the surface of the newest toplevel.

use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::sync::Arc;

use nix::sys::memfd::{MemFdCreateFlag, memfd_create};
use tracing::debug;
use vwm_protocol::schema::{display, seat};
use vwm_protocol::{Interface, ObjectId};

use super::{HANDLER_TARGET, version_of};
use crate::connection::Client;
use crate::connection::dispatch::{Args, DispatchTable};
use crate::connection::errors::ProtocolError;
use crate::connection::objects::{Object, ObjectState};

const SEAT_NAME: &str = "seat0";

pub(super) fn register(table: &mut DispatchTable) {
    table.register(Interface::Seat, seat::request::GET_POINTER, get_pointer);
    table.register(Interface::Seat, seat::request::GET_KEYBOARD, get_keyboard);
    table.register(Interface::Seat, seat::request::GET_TOUCH, get_touch);
}

pub(super) fn announce(client: &mut Client, seat_id: ObjectId, version: u32) -> Result<(), ProtocolError> {
    client.seat_capabilities(seat_id, seat::capability::POINTER | seat::capability::KEYBOARD)?;
    if version >= 2 {
        client.seat_name(seat_id, SEAT_NAME)?;
    }
    Ok(())
}

fn get_pointer(client: &mut Client, seat_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    add_device(client, seat_id, args.new_id(0)?, Interface::Pointer)
}

/// Touch is not advertised, but the request stays legal for old clients.
fn get_touch(client: &mut Client, seat_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    add_device(client, seat_id, args.new_id(0)?, Interface::Touch)
}

fn add_device(client: &mut Client, seat_id: ObjectId, id: ObjectId, interface: Interface) -> Result<(), ProtocolError> {
    let version = version_of(client, seat_id)?;
    client.objects.add(id, Object::plain(interface, version))?;
    Ok(())
}

/// Creates a keyboard and sends it the keymap, repeat settings and, when
/// this client already holds focus, an enter event.
fn get_keyboard(client: &mut Client, seat_id: ObjectId, args: &mut Args) -> Result<(), ProtocolError> {
    let id = args.new_id(0)?;
    let version = version_of(client, seat_id)?;
    client.objects.add(id, Object::plain(Interface::Keyboard, version))?;

    let input = Arc::clone(&client.collaborators.input);
    let (fd, size) = keymap_fd(input.keymap()).map_err(|error| {
        ProtocolError::invalid(
            ObjectId::DISPLAY,
            display::error::NO_MEMORY,
            format!("cannot share keymap: {error}"),
        )
    })?;
    client.keyboard_keymap(id, fd, size)?;
    if version >= 4 {
        let (rate, delay) = input.repeat_info();
        client.keyboard_repeat_info(id, rate, delay)?;
    }
    if let Some(surface) = client.keyboard_focus {
        client.keyboard_enter(id, surface)?;
        client.keyboard_modifiers(id)?;
    }
    Ok(())
}

/// Copies the keymap, NUL-terminated, into an anonymous memfd.
fn keymap_fd(keymap: &[u8]) -> std::io::Result<(OwnedFd, u32)> {
    let fd = memfd_create(c"vwm-keymap", MemFdCreateFlag::MFD_CLOEXEC)?;
    let mut file = File::from(fd);
    file.write_all(keymap)?;
    file.write_all(&[0])?;
    let size = u32::try_from(keymap.len() + 1)
        .map_err(|_| std::io::Error::other("keymap larger than 4 GiB"))?;
    Ok((OwnedFd::from(file), size))
}

impl Client {
    /// Surface of the toplevel with the highest object id.
    fn newest_toplevel_surface(&self) -> Option<ObjectId> {
        self.objects
            .iter()
            .filter_map(|(_, object)| match &object.state {
                ObjectState::Toplevel(toplevel) => toplevel.xdg_surface,
                _ => None,
            })
            .filter_map(|xdg| match self.objects.get(xdg).map(|object| &object.state) {
                Ok(ObjectState::XdgSurface(state)) => Some(state.surface),
                _ => None,
            })
            .last()
    }

    /// Applies a focus change decided by the seat.
    pub fn focus_changed(&mut self, gained: bool) -> Result<(), ProtocolError> {
        let target = if gained {
            self.newest_toplevel_surface()
        } else {
            None
        };
        if target == self.keyboard_focus {
            return Ok(());
        }
        self.drop_keyboard_focus()?;
        let Some(surface) = target else {
            return Ok(());
        };
        for keyboard in self.objects.ids_of(Interface::Keyboard) {
            self.keyboard_enter(keyboard, surface)?;
            self.keyboard_modifiers(keyboard)?;
        }
        self.keyboard_focus = Some(surface);
        debug!(target: HANDLER_TARGET, client = %self.id(), %surface, "keyboard entered surface");
        Ok(())
    }

    /// Sends leave for the focused surface, if any, and forgets it.
    pub(crate) fn drop_keyboard_focus(&mut self) -> Result<(), ProtocolError> {
        let Some(surface) = self.keyboard_focus.take() else {
            return Ok(());
        };
        for keyboard in self.objects.ids_of(Interface::Keyboard) {
            self.keyboard_leave(keyboard, surface)?;
        }
        Ok(())
    }

    /// Forwards a key to every keyboard while a surface has focus.
    pub fn deliver_key(&mut self, time: u32, key: u32, pressed: bool) -> Result<(), ProtocolError> {
        if self.keyboard_focus.is_none() {
            return Ok(());
        }
        for keyboard in self.objects.ids_of(Interface::Keyboard) {
            self.keyboard_key(keyboard, time, key, pressed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek};

    use rstest::rstest;
    use vwm_protocol::ArgValue;
    use vwm_protocol::schema::keyboard;

    use super::*;
    use crate::handlers::test_support::{Harness, harness, id};
    use crate::input::{DEFAULT_KEYMAP, REPEAT_DELAY, REPEAT_RATE};

    const SEAT: u32 = 3;
    const KEYBOARD: u32 = 4;

    fn with_seat(harness: &mut Harness, version: u32) {
        harness.get_registry(2);
        harness.bind(2, 3, "wl_seat", version, SEAT);
    }

    #[rstest]
    #[case(5, 2)]
    #[case(1, 1)]
    fn seat_announces_capabilities(mut harness: Harness, #[case] version: u32, #[case] expected: usize) {
        with_seat(&mut harness, version);
        let events: Vec<_> = harness.events().into_iter().filter(|event| event.object == SEAT).collect();
        assert_eq!(events.len(), expected);
        assert_eq!(events[0].opcode, seat::event::CAPABILITIES);
        assert_eq!(events[0].uint(0), seat::capability::POINTER | seat::capability::KEYBOARD);
        if expected == 2 {
            assert_eq!(events[1].string(0), SEAT_NAME);
        }
    }

    #[rstest]
    fn keyboards_receive_the_keymap(mut harness: Harness) {
        with_seat(&mut harness, 5);
        harness.events();
        harness.request(SEAT, seat::request::GET_KEYBOARD, vec![ArgValue::NewId(id(KEYBOARD))]);

        let events = harness.events();
        assert_eq!(events[0].opcode, keyboard::event::KEYMAP);
        assert_eq!(events[0].uint(0), keyboard::keymap_format::XKB_V1);
        let size = events[0].uint(1) as usize;
        assert_eq!(size, DEFAULT_KEYMAP.len() + 1);
        assert_eq!(events[1].opcode, keyboard::event::REPEAT_INFO);
        assert_eq!((events[1].int(0), events[1].int(1)), (REPEAT_RATE, REPEAT_DELAY));

        let mut keymap = File::from(harness.take_peer_fd());
        keymap.rewind().expect("rewind keymap");
        let mut contents = Vec::new();
        keymap.read_to_end(&mut contents).expect("read keymap");
        assert_eq!(contents.len(), size);
        assert_eq!(contents.last(), Some(&0));
        assert!(contents.starts_with(b"xkb_keymap"));
    }

    #[rstest]
    fn old_keyboards_get_no_repeat_info(mut harness: Harness) {
        with_seat(&mut harness, 3);
        harness.events();
        harness.request(SEAT, seat::request::GET_KEYBOARD, vec![ArgValue::NewId(id(KEYBOARD))]);
        let opcodes: Vec<u16> = harness.events().iter().map(|event| event.opcode).collect();
        assert_eq!(opcodes, vec![keyboard::event::KEYMAP]);
    }

    #[rstest]
    fn keys_need_a_focused_surface(mut harness: Harness) {
        with_seat(&mut harness, 5);
        harness.request(SEAT, seat::request::GET_KEYBOARD, vec![ArgValue::NewId(id(KEYBOARD))]);
        harness.events();

        harness.client.deliver_key(5, 30, true).expect("deliver");
        assert!(harness.events().is_empty());

        harness.client.keyboard_focus = Some(id(9));
        harness.client.deliver_key(5, 30, true).expect("deliver");
        let events = harness.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].opcode, keyboard::event::KEY);
        assert_eq!((events[0].uint(1), events[0].uint(2), events[0].uint(3)), (5, 30, 1));
    }

    #[rstest]
    fn losing_focus_sends_leave(mut harness: Harness) {
        with_seat(&mut harness, 5);
        harness.request(SEAT, seat::request::GET_KEYBOARD, vec![ArgValue::NewId(id(KEYBOARD))]);
        harness.client.keyboard_focus = Some(id(9));
        harness.events();

        harness.client.focus_changed(false).expect("focus lost");
        let events = harness.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].opcode, keyboard::event::LEAVE);
        assert_eq!(events[0].uint(1), 9);
        assert_eq!(harness.client.keyboard_focus, None);
    }
}
