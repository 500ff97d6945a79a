// Adapters layer: concrete implementations for external systems (http dataset source, svg canvases).

pub mod http;
pub mod svg;
