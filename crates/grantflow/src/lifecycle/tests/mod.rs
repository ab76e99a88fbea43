mod common;
mod engine;
mod gateway;
