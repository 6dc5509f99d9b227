#![allow(dead_code)]
pub mod manual_clock;
pub mod prepare_env;
pub mod scripted_oracle;
