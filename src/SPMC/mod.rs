mod builder;
mod consumer;
mod producer;

pub use builder::QueueBuilder;
pub use consumer::Consumer;
pub use producer::Producer;

pub mod Ring {
    pub mod Ring;
    pub mod Ring_impl;
    pub mod layout;
    pub use Ring::Segment; // re-export for stable path
    pub use Ring_impl::Cursors;
}
