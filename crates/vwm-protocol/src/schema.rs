//! Static description of every interface the server speaks.
//!
//! Each interface lists its requests and events in declaration order; a
//! message's opcode is its index within that list. The tables are the single
//! source the [`crate::registry`] compiles layout plans from, so adding an
//! interface means adding a table here and nothing else.

use crate::kind::{ArgKind, ArgSpec, InterfaceSpec, MessageSpec};

macro_rules! arg {
    ($name:literal : ? $kind:expr) => {
        ArgSpec {
            name: $name,
            kind: $kind,
            nullable: true,
        }
    };
    ($name:literal : $kind:expr) => {
        ArgSpec {
            name: $name,
            kind: $kind,
            nullable: false,
        }
    };
}

macro_rules! message {
    ($name:literal [$($arg:expr),* $(,)?]) => {
        MessageSpec {
            name: $name,
            args: &[$($arg),*],
            destructor: false,
        }
    };
    (destructor $name:literal [$($arg:expr),* $(,)?]) => {
        MessageSpec {
            name: $name,
            args: &[$($arg),*],
            destructor: true,
        }
    };
}

use ArgKind::{Array, Fd, Fixed, GenericNewId, Int, NewId, Object, String, Uint};

/// Tag identifying the interface of a server-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interface {
    Display,
    Registry,
    Callback,
    Compositor,
    ShmPool,
    Shm,
    Buffer,
    Surface,
    Region,
    Seat,
    Pointer,
    Keyboard,
    Touch,
    Output,
    WmBase,
    Positioner,
    XdgSurface,
    Toplevel,
    Popup,
    LinuxDmabuf,
    LinuxBufferParams,
}

impl Interface {
    /// Every interface, in table order.
    pub const ALL: [Self; 21] = [
        Self::Display,
        Self::Registry,
        Self::Callback,
        Self::Compositor,
        Self::ShmPool,
        Self::Shm,
        Self::Buffer,
        Self::Surface,
        Self::Region,
        Self::Seat,
        Self::Pointer,
        Self::Keyboard,
        Self::Touch,
        Self::Output,
        Self::WmBase,
        Self::Positioner,
        Self::XdgSurface,
        Self::Toplevel,
        Self::Popup,
        Self::LinuxDmabuf,
        Self::LinuxBufferParams,
    ];

    /// Name used on the wire, e.g. in `wl_registry.bind`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Display => "wl_display",
            Self::Registry => "wl_registry",
            Self::Callback => "wl_callback",
            Self::Compositor => "wl_compositor",
            Self::ShmPool => "wl_shm_pool",
            Self::Shm => "wl_shm",
            Self::Buffer => "wl_buffer",
            Self::Surface => "wl_surface",
            Self::Region => "wl_region",
            Self::Seat => "wl_seat",
            Self::Pointer => "wl_pointer",
            Self::Keyboard => "wl_keyboard",
            Self::Touch => "wl_touch",
            Self::Output => "wl_output",
            Self::WmBase => "xdg_wm_base",
            Self::Positioner => "xdg_positioner",
            Self::XdgSurface => "xdg_surface",
            Self::Toplevel => "xdg_toplevel",
            Self::Popup => "xdg_popup",
            Self::LinuxDmabuf => "zwp_linux_dmabuf_v1",
            Self::LinuxBufferParams => "zwp_linux_buffer_params_v1",
        }
    }

    /// Looks an interface up by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|interface| interface.name() == name)
    }

    /// The declarative table for this interface.
    #[must_use]
    pub const fn spec(self) -> &'static InterfaceSpec {
        match self {
            Self::Display => &DISPLAY,
            Self::Registry => &REGISTRY,
            Self::Callback => &CALLBACK,
            Self::Compositor => &COMPOSITOR,
            Self::ShmPool => &SHM_POOL,
            Self::Shm => &SHM,
            Self::Buffer => &BUFFER,
            Self::Surface => &SURFACE,
            Self::Region => &REGION,
            Self::Seat => &SEAT,
            Self::Pointer => &POINTER,
            Self::Keyboard => &KEYBOARD,
            Self::Touch => &TOUCH,
            Self::Output => &OUTPUT,
            Self::WmBase => &WM_BASE,
            Self::Positioner => &POSITIONER,
            Self::XdgSurface => &XDG_SURFACE,
            Self::Toplevel => &TOPLEVEL,
            Self::Popup => &POPUP,
            Self::LinuxDmabuf => &LINUX_DMABUF,
            Self::LinuxBufferParams => &LINUX_BUFFER_PARAMS,
        }
    }
}

static DISPLAY: InterfaceSpec = InterfaceSpec {
    interface: Interface::Display,
    version: 1,
    requests: &[
        message!("sync" [arg!("callback": NewId(Interface::Callback))]),
        message!("get_registry" [arg!("registry": NewId(Interface::Registry))]),
    ],
    events: &[
        message!("error" [
            arg!("object_id": Object),
            arg!("code": Uint),
            arg!("message": String),
        ]),
        message!("delete_id" [arg!("id": Uint)]),
    ],
};

static REGISTRY: InterfaceSpec = InterfaceSpec {
    interface: Interface::Registry,
    version: 1,
    requests: &[message!("bind" [arg!("name": Uint), arg!("id": GenericNewId)])],
    events: &[
        message!("global" [
            arg!("name": Uint),
            arg!("interface": String),
            arg!("version": Uint),
        ]),
        message!("global_remove" [arg!("name": Uint)]),
    ],
};

static CALLBACK: InterfaceSpec = InterfaceSpec {
    interface: Interface::Callback,
    version: 1,
    requests: &[],
    events: &[message!(destructor "done" [arg!("callback_data": Uint)])],
};

static COMPOSITOR: InterfaceSpec = InterfaceSpec {
    interface: Interface::Compositor,
    version: 5,
    requests: &[
        message!("create_surface" [arg!("id": NewId(Interface::Surface))]),
        message!("create_region" [arg!("id": NewId(Interface::Region))]),
    ],
    events: &[],
};

static SHM_POOL: InterfaceSpec = InterfaceSpec {
    interface: Interface::ShmPool,
    version: 1,
    requests: &[
        message!("create_buffer" [
            arg!("id": NewId(Interface::Buffer)),
            arg!("offset": Int),
            arg!("width": Int),
            arg!("height": Int),
            arg!("stride": Int),
            arg!("format": Uint),
        ]),
        message!(destructor "destroy" []),
        message!("resize" [arg!("size": Int)]),
    ],
    events: &[],
};

static SHM: InterfaceSpec = InterfaceSpec {
    interface: Interface::Shm,
    version: 1,
    requests: &[message!("create_pool" [
        arg!("id": NewId(Interface::ShmPool)),
        arg!("fd": Fd),
        arg!("size": Int),
    ])],
    events: &[message!("format" [arg!("format": Uint)])],
};

static BUFFER: InterfaceSpec = InterfaceSpec {
    interface: Interface::Buffer,
    version: 1,
    requests: &[message!(destructor "destroy" [])],
    events: &[message!("release" [])],
};

static SURFACE: InterfaceSpec = InterfaceSpec {
    interface: Interface::Surface,
    version: 5,
    requests: &[
        message!(destructor "destroy" []),
        message!("attach" [
            arg!("buffer": ? Object),
            arg!("x": Int),
            arg!("y": Int),
        ]),
        message!("damage" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("frame" [arg!("callback": NewId(Interface::Callback))]),
        message!("set_opaque_region" [arg!("region": ? Object)]),
        message!("set_input_region" [arg!("region": ? Object)]),
        message!("commit" []),
        message!("set_buffer_transform" [arg!("transform": Int)]),
        message!("set_buffer_scale" [arg!("scale": Int)]),
        message!("damage_buffer" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("offset" [arg!("x": Int), arg!("y": Int)]),
    ],
    events: &[
        message!("enter" [arg!("output": Object)]),
        message!("leave" [arg!("output": Object)]),
    ],
};

static REGION: InterfaceSpec = InterfaceSpec {
    interface: Interface::Region,
    version: 1,
    requests: &[
        message!(destructor "destroy" []),
        message!("add" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("subtract" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
    ],
    events: &[],
};

static SEAT: InterfaceSpec = InterfaceSpec {
    interface: Interface::Seat,
    version: 5,
    requests: &[
        message!("get_pointer" [arg!("id": NewId(Interface::Pointer))]),
        message!("get_keyboard" [arg!("id": NewId(Interface::Keyboard))]),
        message!("get_touch" [arg!("id": NewId(Interface::Touch))]),
        message!(destructor "release" []),
    ],
    events: &[
        message!("capabilities" [arg!("capabilities": Uint)]),
        message!("name" [arg!("name": String)]),
    ],
};

static POINTER: InterfaceSpec = InterfaceSpec {
    interface: Interface::Pointer,
    version: 5,
    requests: &[
        message!("set_cursor" [
            arg!("serial": Uint),
            arg!("surface": ? Object),
            arg!("hotspot_x": Int),
            arg!("hotspot_y": Int),
        ]),
        message!(destructor "release" []),
    ],
    events: &[
        message!("enter" [
            arg!("serial": Uint),
            arg!("surface": Object),
            arg!("surface_x": Fixed),
            arg!("surface_y": Fixed),
        ]),
        message!("leave" [arg!("serial": Uint), arg!("surface": Object)]),
        message!("motion" [
            arg!("time": Uint),
            arg!("surface_x": Fixed),
            arg!("surface_y": Fixed),
        ]),
        message!("button" [
            arg!("serial": Uint),
            arg!("time": Uint),
            arg!("button": Uint),
            arg!("state": Uint),
        ]),
        message!("axis" [
            arg!("time": Uint),
            arg!("axis": Uint),
            arg!("value": Fixed),
        ]),
        message!("frame" []),
    ],
};

static KEYBOARD: InterfaceSpec = InterfaceSpec {
    interface: Interface::Keyboard,
    version: 5,
    requests: &[message!(destructor "release" [])],
    events: &[
        message!("keymap" [
            arg!("format": Uint),
            arg!("fd": Fd),
            arg!("size": Uint),
        ]),
        message!("enter" [
            arg!("serial": Uint),
            arg!("surface": Object),
            arg!("keys": Array),
        ]),
        message!("leave" [arg!("serial": Uint), arg!("surface": Object)]),
        message!("key" [
            arg!("serial": Uint),
            arg!("time": Uint),
            arg!("key": Uint),
            arg!("state": Uint),
        ]),
        message!("modifiers" [
            arg!("serial": Uint),
            arg!("mods_depressed": Uint),
            arg!("mods_latched": Uint),
            arg!("mods_locked": Uint),
            arg!("group": Uint),
        ]),
        message!("repeat_info" [arg!("rate": Int), arg!("delay": Int)]),
    ],
};

static TOUCH: InterfaceSpec = InterfaceSpec {
    interface: Interface::Touch,
    version: 5,
    requests: &[message!(destructor "release" [])],
    events: &[
        message!("down" [
            arg!("serial": Uint),
            arg!("time": Uint),
            arg!("surface": Object),
            arg!("id": Int),
            arg!("x": Fixed),
            arg!("y": Fixed),
        ]),
        message!("up" [arg!("serial": Uint), arg!("time": Uint), arg!("id": Int)]),
        message!("motion" [
            arg!("time": Uint),
            arg!("id": Int),
            arg!("x": Fixed),
            arg!("y": Fixed),
        ]),
        message!("frame" []),
        message!("cancel" []),
    ],
};

static OUTPUT: InterfaceSpec = InterfaceSpec {
    interface: Interface::Output,
    version: 3,
    requests: &[message!(destructor "release" [])],
    events: &[
        message!("geometry" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("physical_width": Int),
            arg!("physical_height": Int),
            arg!("subpixel": Int),
            arg!("make": String),
            arg!("model": String),
            arg!("transform": Int),
        ]),
        message!("mode" [
            arg!("flags": Uint),
            arg!("width": Int),
            arg!("height": Int),
            arg!("refresh": Int),
        ]),
        message!("done" []),
        message!("scale" [arg!("factor": Int)]),
    ],
};

static WM_BASE: InterfaceSpec = InterfaceSpec {
    interface: Interface::WmBase,
    version: 2,
    requests: &[
        message!(destructor "destroy" []),
        message!("create_positioner" [arg!("id": NewId(Interface::Positioner))]),
        message!("get_xdg_surface" [
            arg!("id": NewId(Interface::XdgSurface)),
            arg!("surface": Object),
        ]),
        message!("pong" [arg!("serial": Uint)]),
    ],
    events: &[message!("ping" [arg!("serial": Uint)])],
};

static POSITIONER: InterfaceSpec = InterfaceSpec {
    interface: Interface::Positioner,
    version: 2,
    requests: &[
        message!(destructor "destroy" []),
        message!("set_size" [arg!("width": Int), arg!("height": Int)]),
        message!("set_anchor_rect" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("set_anchor" [arg!("anchor": Uint)]),
        message!("set_gravity" [arg!("gravity": Uint)]),
        message!("set_constraint_adjustment" [arg!("constraint_adjustment": Uint)]),
        message!("set_offset" [arg!("x": Int), arg!("y": Int)]),
    ],
    events: &[],
};

static XDG_SURFACE: InterfaceSpec = InterfaceSpec {
    interface: Interface::XdgSurface,
    version: 2,
    requests: &[
        message!(destructor "destroy" []),
        message!("get_toplevel" [arg!("id": NewId(Interface::Toplevel))]),
        message!("get_popup" [
            arg!("id": NewId(Interface::Popup)),
            arg!("parent": ? Object),
            arg!("positioner": Object),
        ]),
        message!("set_window_geometry" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("ack_configure" [arg!("serial": Uint)]),
    ],
    events: &[message!("configure" [arg!("serial": Uint)])],
};

static TOPLEVEL: InterfaceSpec = InterfaceSpec {
    interface: Interface::Toplevel,
    version: 2,
    requests: &[
        message!(destructor "destroy" []),
        message!("set_parent" [arg!("parent": ? Object)]),
        message!("set_title" [arg!("title": String)]),
        message!("set_app_id" [arg!("app_id": String)]),
        message!("show_window_menu" [
            arg!("seat": Object),
            arg!("serial": Uint),
            arg!("x": Int),
            arg!("y": Int),
        ]),
        message!("move" [arg!("seat": Object), arg!("serial": Uint)]),
        message!("resize" [
            arg!("seat": Object),
            arg!("serial": Uint),
            arg!("edges": Uint),
        ]),
        message!("set_max_size" [arg!("width": Int), arg!("height": Int)]),
        message!("set_min_size" [arg!("width": Int), arg!("height": Int)]),
        message!("set_maximized" []),
        message!("unset_maximized" []),
        message!("set_fullscreen" [arg!("output": ? Object)]),
        message!("unset_fullscreen" []),
        message!("set_minimized" []),
    ],
    events: &[
        message!("configure" [
            arg!("width": Int),
            arg!("height": Int),
            arg!("states": Array),
        ]),
        message!("close" []),
    ],
};

static POPUP: InterfaceSpec = InterfaceSpec {
    interface: Interface::Popup,
    version: 2,
    requests: &[
        message!(destructor "destroy" []),
        message!("grab" [arg!("seat": Object), arg!("serial": Uint)]),
    ],
    events: &[
        message!("configure" [
            arg!("x": Int),
            arg!("y": Int),
            arg!("width": Int),
            arg!("height": Int),
        ]),
        message!("popup_done" []),
    ],
};

static LINUX_DMABUF: InterfaceSpec = InterfaceSpec {
    interface: Interface::LinuxDmabuf,
    version: 3,
    requests: &[
        message!(destructor "destroy" []),
        message!("create_params" [arg!("params_id": NewId(Interface::LinuxBufferParams))]),
    ],
    events: &[
        message!("format" [arg!("format": Uint)]),
        message!("modifier" [
            arg!("format": Uint),
            arg!("modifier_hi": Uint),
            arg!("modifier_lo": Uint),
        ]),
    ],
};

static LINUX_BUFFER_PARAMS: InterfaceSpec = InterfaceSpec {
    interface: Interface::LinuxBufferParams,
    version: 3,
    requests: &[
        message!(destructor "destroy" []),
        message!("add" [
            arg!("fd": Fd),
            arg!("plane_idx": Uint),
            arg!("offset": Uint),
            arg!("stride": Uint),
            arg!("modifier_hi": Uint),
            arg!("modifier_lo": Uint),
        ]),
        message!("create" [
            arg!("width": Int),
            arg!("height": Int),
            arg!("format": Uint),
            arg!("flags": Uint),
        ]),
        message!("create_immed" [
            arg!("buffer_id": NewId(Interface::Buffer)),
            arg!("width": Int),
            arg!("height": Int),
            arg!("format": Uint),
            arg!("flags": Uint),
        ]),
    ],
    events: &[
        message!("created" [arg!("buffer": NewId(Interface::Buffer))]),
        message!("failed" []),
    ],
};

/// `wl_display` opcodes and error codes.
pub mod display {
    pub mod request {
        pub const SYNC: u16 = 0;
        pub const GET_REGISTRY: u16 = 1;
    }
    pub mod event {
        pub const ERROR: u16 = 0;
        pub const DELETE_ID: u16 = 1;
    }
    pub mod error {
        pub const INVALID_OBJECT: u32 = 0;
        pub const INVALID_METHOD: u32 = 1;
        pub const NO_MEMORY: u32 = 2;
        pub const IMPLEMENTATION: u32 = 3;
    }
}

pub mod registry {
    pub mod request {
        pub const BIND: u16 = 0;
    }
    pub mod event {
        pub const GLOBAL: u16 = 0;
        pub const GLOBAL_REMOVE: u16 = 1;
    }
}

pub mod callback {
    pub mod event {
        pub const DONE: u16 = 0;
    }
}

pub mod compositor {
    pub mod request {
        pub const CREATE_SURFACE: u16 = 0;
        pub const CREATE_REGION: u16 = 1;
    }
}

pub mod shm_pool {
    pub mod request {
        pub const CREATE_BUFFER: u16 = 0;
        pub const DESTROY: u16 = 1;
        pub const RESIZE: u16 = 2;
    }
}

pub mod shm {
    pub mod request {
        pub const CREATE_POOL: u16 = 0;
    }
    pub mod event {
        pub const FORMAT: u16 = 0;
    }
    pub mod error {
        pub const INVALID_FORMAT: u32 = 0;
        pub const INVALID_STRIDE: u32 = 1;
        pub const INVALID_FD: u32 = 2;
    }
    /// Pixel formats every shm implementation must support.
    pub mod format {
        pub const ARGB8888: u32 = 0;
        pub const XRGB8888: u32 = 1;
    }
}

pub mod buffer {
    pub mod request {
        pub const DESTROY: u16 = 0;
    }
    pub mod event {
        pub const RELEASE: u16 = 0;
    }
}

pub mod surface {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const ATTACH: u16 = 1;
        pub const DAMAGE: u16 = 2;
        pub const FRAME: u16 = 3;
        pub const SET_OPAQUE_REGION: u16 = 4;
        pub const SET_INPUT_REGION: u16 = 5;
        pub const COMMIT: u16 = 6;
        pub const SET_BUFFER_TRANSFORM: u16 = 7;
        pub const SET_BUFFER_SCALE: u16 = 8;
        pub const DAMAGE_BUFFER: u16 = 9;
        pub const OFFSET: u16 = 10;
    }
    pub mod event {
        pub const ENTER: u16 = 0;
        pub const LEAVE: u16 = 1;
    }
    pub mod error {
        pub const INVALID_SCALE: u32 = 0;
        pub const INVALID_TRANSFORM: u32 = 1;
    }
}

pub mod region {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const ADD: u16 = 1;
        pub const SUBTRACT: u16 = 2;
    }
}

pub mod seat {
    pub mod request {
        pub const GET_POINTER: u16 = 0;
        pub const GET_KEYBOARD: u16 = 1;
        pub const GET_TOUCH: u16 = 2;
        pub const RELEASE: u16 = 3;
    }
    pub mod event {
        pub const CAPABILITIES: u16 = 0;
        pub const NAME: u16 = 1;
    }
    pub mod capability {
        pub const POINTER: u32 = 1;
        pub const KEYBOARD: u32 = 2;
        pub const TOUCH: u32 = 4;
    }
}

pub mod pointer {
    pub mod request {
        pub const SET_CURSOR: u16 = 0;
        pub const RELEASE: u16 = 1;
    }
}

pub mod keyboard {
    pub mod request {
        pub const RELEASE: u16 = 0;
    }
    pub mod event {
        pub const KEYMAP: u16 = 0;
        pub const ENTER: u16 = 1;
        pub const LEAVE: u16 = 2;
        pub const KEY: u16 = 3;
        pub const MODIFIERS: u16 = 4;
        pub const REPEAT_INFO: u16 = 5;
    }
    pub mod keymap_format {
        pub const NO_KEYMAP: u32 = 0;
        pub const XKB_V1: u32 = 1;
    }
}

pub mod touch {
    pub mod request {
        pub const RELEASE: u16 = 0;
    }
}

pub mod output {
    pub mod request {
        pub const RELEASE: u16 = 0;
    }
    pub mod event {
        pub const GEOMETRY: u16 = 0;
        pub const MODE: u16 = 1;
        pub const DONE: u16 = 2;
        pub const SCALE: u16 = 3;
    }
    pub mod mode {
        pub const CURRENT: u32 = 1;
        pub const PREFERRED: u32 = 2;
    }
}

pub mod wm_base {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const CREATE_POSITIONER: u16 = 1;
        pub const GET_XDG_SURFACE: u16 = 2;
        pub const PONG: u16 = 3;
    }
    pub mod event {
        pub const PING: u16 = 0;
    }
    pub mod error {
        pub const ROLE: u32 = 0;
        pub const DEFUNCT_SURFACES: u32 = 1;
        pub const NOT_THE_TOPMOST_POPUP: u32 = 2;
        pub const INVALID_POPUP_PARENT: u32 = 3;
        pub const INVALID_SURFACE_STATE: u32 = 4;
        pub const INVALID_POSITIONER: u32 = 5;
    }
}

pub mod positioner {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const SET_SIZE: u16 = 1;
        pub const SET_ANCHOR_RECT: u16 = 2;
        pub const SET_ANCHOR: u16 = 3;
        pub const SET_GRAVITY: u16 = 4;
        pub const SET_CONSTRAINT_ADJUSTMENT: u16 = 5;
        pub const SET_OFFSET: u16 = 6;
    }
}

pub mod xdg_surface {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const GET_TOPLEVEL: u16 = 1;
        pub const GET_POPUP: u16 = 2;
        pub const SET_WINDOW_GEOMETRY: u16 = 3;
        pub const ACK_CONFIGURE: u16 = 4;
    }
    pub mod event {
        pub const CONFIGURE: u16 = 0;
    }
    pub mod error {
        pub const NOT_CONSTRUCTED: u32 = 1;
        pub const ALREADY_CONSTRUCTED: u32 = 2;
        pub const UNCONFIGURED_BUFFER: u32 = 3;
    }
}

pub mod toplevel {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const SET_PARENT: u16 = 1;
        pub const SET_TITLE: u16 = 2;
        pub const SET_APP_ID: u16 = 3;
        pub const SHOW_WINDOW_MENU: u16 = 4;
        pub const MOVE: u16 = 5;
        pub const RESIZE: u16 = 6;
        pub const SET_MAX_SIZE: u16 = 7;
        pub const SET_MIN_SIZE: u16 = 8;
        pub const SET_MAXIMIZED: u16 = 9;
        pub const UNSET_MAXIMIZED: u16 = 10;
        pub const SET_FULLSCREEN: u16 = 11;
        pub const UNSET_FULLSCREEN: u16 = 12;
        pub const SET_MINIMIZED: u16 = 13;
    }
    pub mod event {
        pub const CONFIGURE: u16 = 0;
        pub const CLOSE: u16 = 1;
    }
    pub mod state {
        pub const MAXIMIZED: u32 = 1;
        pub const FULLSCREEN: u32 = 2;
        pub const RESIZING: u32 = 3;
        pub const ACTIVATED: u32 = 4;
    }
}

pub mod popup {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const GRAB: u16 = 1;
    }
    pub mod event {
        pub const CONFIGURE: u16 = 0;
        pub const POPUP_DONE: u16 = 1;
    }
}

pub mod linux_dmabuf {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const CREATE_PARAMS: u16 = 1;
    }
    pub mod event {
        pub const FORMAT: u16 = 0;
        pub const MODIFIER: u16 = 1;
    }
}

pub mod linux_buffer_params {
    pub mod request {
        pub const DESTROY: u16 = 0;
        pub const ADD: u16 = 1;
        pub const CREATE: u16 = 2;
        pub const CREATE_IMMED: u16 = 3;
    }
    pub mod event {
        pub const CREATED: u16 = 0;
        pub const FAILED: u16 = 1;
    }
    pub mod error {
        pub const ALREADY_USED: u32 = 0;
        pub const PLANE_IDX: u32 = 1;
        pub const PLANE_SET: u32 = 2;
        pub const INCOMPLETE: u32 = 3;
        pub const INVALID_FORMAT: u32 = 4;
        pub const INVALID_DIMENSIONS: u32 = 5;
        pub const OUT_OF_BOUNDS: u32 = 6;
        pub const INVALID_WL_BUFFER: u32 = 7;
    }
}
