mod common;

mod admin;
mod routing;
