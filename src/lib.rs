#![allow(dead_code)]

#[macro_use]
extern crate bitflags;

pub mod audio;
pub mod bus;
pub mod chip;
pub mod clock;
pub mod error;
#[cfg(feature = "formats")]
pub mod formats;
pub mod io;
pub mod machine;
pub mod memory;
pub mod video;

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}
