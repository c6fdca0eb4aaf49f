// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires [`SampleProducer`] → [`SignalMixer`] → [`RtlBroadcaster`] into the
//! streaming loop from `original_source/sdr-service/app/main.py::stream_loop`:
//! pull a chunk, mix in any active jamming, broadcast, repeat. Mid-stream
//! control (play/pause/stop, jamming mode changes) is out of this module's
//! scope — callers mutate the shared `producer`/`mixer` handles directly
//! from wherever they terminate MessageBus control messages.

use std::sync::Arc;

use crate::broadcaster::RtlBroadcaster;
use crate::mixer::SignalMixer;
use crate::producer::SampleProducer;

/// Default chunk size, matching the original's `chunk_size=16384` default.
pub const DEFAULT_CHUNK_SAMPLES: usize = 16384;

/// Run the producer → mixer → broadcaster loop forever. Intended to be
/// spawned as its own task; returns only if the producer itself cannot
/// make progress (never, in the current `SampleProducer` implementation —
/// it always eventually yields `None` and backs off rather than erroring).
pub async fn run_stream_loop(
    producer: Arc<SampleProducer>,
    mixer: Arc<SignalMixer>,
    broadcaster: Arc<RtlBroadcaster>,
    chunk_samples: usize,
) {
    loop {
        if let Some(chunk) = producer.next_chunk(chunk_samples).await {
            let mixed = mixer.mix(&chunk);
            broadcaster.broadcast(&mixed).await;
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
