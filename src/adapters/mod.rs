// Adapters layer: concrete implementations of the capability ports (PDF, tools, web, storage).

pub mod browser;
pub mod html;
pub mod http;
pub mod pdf;
pub mod storage;
pub mod tools;
