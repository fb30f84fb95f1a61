pub mod feedback;
pub mod magic_link;
pub mod preview;
