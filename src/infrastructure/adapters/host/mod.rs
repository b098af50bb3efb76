//! Host Adapter - 宿主媒体库客户端

mod graphql_host_client;

pub use graphql_host_client::*;
