// cargo +nightly bench --bench video -- --nocapture
#![feature(test)]
extern crate test;
use test::{black_box, Bencher};

use rand::prelude::*;
use zxcore::machine::Machine;
use zxcore::memory::Model;
use zxcore::video::VideoOut;
use zxcore_core::audio::AudioSink;
use zxcore_core::memory::ZxMemory;

struct CountingVideo {
    rects: u64,
}
impl VideoOut for CountingVideo {
    fn set_palette(&mut self, _pal: &[u8; 3 * 16]) {}
    fn pixel(&mut self, _x: u16, _y: u16, _color_index: u8) {
        self.rects += 1;
    }
    fn rect(&mut self, _x0: u16, _y0: u16, _x1: u16, _y1: u16, _color_index: u8) {
        self.rects += 1;
    }
    fn end_field(&mut self) {}
}

struct NullAudio;
impl AudioSink for NullAudio {
    type Err = std::convert::Infallible;
    fn write(&mut self, _frame: &[u8]) -> Result<(), Self::Err> {
        Ok(())
    }
}

fn randomized_machine(model: Model) -> Machine {
    let rom = vec![0u8; model.rom_banks() * 0x4000];
    let mut machine = Machine::new(model, &rom, 448).unwrap();
    // Poke randomized bytes straight into the visible screen banks so the
    // renderer isn't just scanning a flat zero buffer every T-state.
    for bank in 0..model.ram_banks() {
        if let Ok(ram) = machine.memory_mut().ram_bank_mut(bank) {
            thread_rng().fill(ram);
        }
    }
    machine
}

#[bench]
fn bench_render_frame_zx48(ben: &mut Bencher) {
    bench_render(ben, Model::Zx48);
}

#[bench]
fn bench_render_frame_plus3(ben: &mut Bencher) {
    bench_render(ben, Model::Plus3);
}

fn bench_render(ben: &mut Bencher, model: Model) {
    let mut machine = randomized_machine(model);
    let mut video = CountingVideo { rects: 0 };
    let mut audio = NullAudio;
    ben.iter(|| {
        for _ in 0..50 {
            let _ = machine.run_frame(&mut video, &mut audio).unwrap();
        }
        black_box(video.rects);
    });
}
