#![allow(clippy::let_and_return)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

#[macro_use]
extern crate log;

mod app;

fn main() {
    let return_code = app::run_app();
    std::process::exit(return_code)
}
