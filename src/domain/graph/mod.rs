pub mod element;
pub mod graph_instance;
pub mod layout;
pub mod renderer;
pub mod viewport;
