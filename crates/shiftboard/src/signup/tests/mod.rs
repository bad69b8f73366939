mod common;
mod disposition;
