//! # Events Module
//!
//! Progress reporting decoupled from presentation.
//!
//! The core engine emits events through a channel; the CLI (or any other
//! front end) subscribes and renders them. Nothing in the engine waits on
//! the receiver.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Extract(ExtractEvent::Progress(p)) => {
//!                 println!("Extracted {}/{}", p.completed, p.total)
//!             }
//!             Event::Resolve(ResolveEvent::Resolved { keep, delete, .. }) => {
//!                 println!("{} duplicates {}", delete.display(), keep.display())
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
