pub mod client;

pub use client::NatsEventMirror;
