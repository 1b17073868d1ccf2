//! The server side of Kite: windows, workspaces and the pixels they end up as.
//!
//! A [`Desktop`] owns every [`Window`] on a screen and decides, front to back, which part of
//! the screen each of them may draw on. Clients talk to their window through
//! [`ClientRequest`]s and hear back through [`Envelope`]s. A window can also live without a
//! screen and render into a [`ServerBitmap`] instead (see [`Window::offscreen`]).
//!
//! Geometry and the view tree live in [`kite_core`].

pub mod bitmap;
pub mod bitmap_hw_interface;
pub mod desktop;
pub mod drawing_engine;
pub mod error;
pub mod hw_interface;
pub mod message;
mod offscreen;
pub mod server_window;
pub mod settings;
pub mod window;
pub mod window_list;

pub use bitmap::{ColorSpace, ServerBitmap, SharedBitmap};
pub use bitmap_hw_interface::BitmapHWInterface;
pub use desktop::{ClientConnection, Desktop, WindowArena};
pub use drawing_engine::DrawingEngine;
pub use error::{HwError, SettingsError, WindowError};
pub use hw_interface::{ExclusiveAccess, HWInterface, HwState};
pub use message::{client_port, ClientPort, Envelope, Message, MessageTarget};
pub use server_window::{ClientRequest, RequestOutcome, ServerWindow};
pub use settings::DesktopSettings;
pub use window::{Window, WindowAnchor, WindowArchive, WindowId, WindowKind};
pub use window_list::{AnchorStore, WindowList};
