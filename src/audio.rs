/*!
# Audio API
```text
  +----------------------+                          +------------------+
  |   Ula / ear+mic bit   |  set_level per toggle    | AudioFrameSampler|
  +----------------------+ =======================> |  (zxcore-core)   |
                                   end_frame()        +------------------+
                                                               |
                                                               v rendered 8-bit PCM frame
                                                      +------------------+
                                                      |  AudioSink::write|
                                                      +------------------+
                                                               |
                                                      zxcore-audio::ring
                                                               |
                                                      * host playback thread *
```
The AY-3-8912 mixing path (`synth`/`ay`) the teacher library built here is a
named Non-goal; only the tone/tape mono path survives.
*/
pub use zxcore_core::audio::{AudioBackendError, AudioFrameSampler, AudioSink};
