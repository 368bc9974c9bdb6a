mod common;
mod coordinator;
mod tracker;
