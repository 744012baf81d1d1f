#![doc = include_str!("../README.md")]

mod upstream;

pub use upstream::ReqwestUpstream;

pub use reqwest_middleware::ClientWithMiddleware;
