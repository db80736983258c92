pub mod http_client;

pub use http_client::{redact_url, HttpClientPort, ReqwestHttp};
