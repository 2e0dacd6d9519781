//! Collects text files from dropped paths and concatenates them into one
//! clipboard payload.

pub mod app;
