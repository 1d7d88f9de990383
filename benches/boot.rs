/*
    boot: benchmark program for the zxcore library.

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
// cargo +nightly bench --bench boot -- --nocapture
#![feature(test)]
extern crate test;
use test::{black_box, Bencher};

use rand::prelude::*;
use zxcore::machine::Machine;
use zxcore::memory::Model;
use zxcore::video::VideoOut;
use zxcore_core::audio::AudioSink;

struct NullVideo;
impl VideoOut for NullVideo {
    fn set_palette(&mut self, _pal: &[u8; 3 * 16]) {}
    fn pixel(&mut self, _x: u16, _y: u16, _color_index: u8) {}
    fn rect(&mut self, _x0: u16, _y0: u16, _x1: u16, _y1: u16, _color_index: u8) {}
    fn end_field(&mut self) {}
}

struct NullAudio;
impl AudioSink for NullAudio {
    type Err = std::convert::Infallible;
    fn write(&mut self, _frame: &[u8]) -> Result<(), Self::Err> {
        Ok(())
    }
}

/// No actual 48.rom is bundled (a copyrighted binary); this measures
/// sustained CPU/ULA throughput against a randomized RAM and an all-zero
/// ROM rather than a real boot sequence, per the "run with no ROM" scenario.
fn random_rom(len: usize) -> Vec<u8> {
    let mut rng = rand::rngs::SmallRng::from_entropy();
    (0..len).map(|_| rng.gen()).collect()
}

#[bench]
fn bench_run_frame_zx48(ben: &mut Bencher) {
    run_frames(ben, Model::Zx48, 50);
}

#[bench]
fn bench_run_frame_plus3(ben: &mut Bencher) {
    run_frames(ben, Model::Plus3, 50);
}

fn run_frames(ben: &mut Bencher, model: Model, frame_count: u64) {
    let rom = random_rom(model.rom_banks() * 0x4000);
    let mut machine = Machine::new(model, &rom, 448).unwrap();
    let mut video = NullVideo;
    let mut audio = NullAudio;
    ben.iter(|| {
        machine.reset();
        let mut total = 0u32;
        for _ in 0..frame_count {
            let result = machine.run_frame(&mut video, &mut audio).unwrap();
            total += result.tstates_spent;
        }
        black_box(total);
    });
}

