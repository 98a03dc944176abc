pub mod audio;
pub mod events;
pub mod session;
mod content;

pub use content::{
    Content, InputTextContent, Item, MessageItem, MessageItemBuilder, MessageRole, TextContent,
};
pub use events::{ClientEvent, ServerEvent};
pub use session::{Session, SessionBuilder};
