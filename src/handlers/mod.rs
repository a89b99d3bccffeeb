pub mod demo;
pub mod index;
pub mod openapi;
pub mod proxy;

pub use demo::{DemoRequest, DemoResponse, generate_video_demo};
pub use index::{api_index, health};
pub use openapi::{openapi_document, openapi_json};
pub use proxy::generate_video_proxy;
