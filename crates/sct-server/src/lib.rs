//! # sct-server
//!
//! RPC and HTTP surfaces of the terminology server, multiplexed on a single
//! listener: HTTP/2 frames with `content-type: application/grpc` take the
//! tonic routes, plain HTTP/1 requests the axum gateway, both backed by the
//! same in-process [`sct_terminology::TerminologySvc`].

#[allow(missing_docs)]
pub mod proto {
    //! Generated protobuf types.
    tonic::include_proto!("terminology");
}

pub mod http;
mod server;

pub use server::TerminologyServer;
