use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rodio::Source;

use crate::media::AudioTap;

use super::chain::SignalChain;

const BLOCK_FRAMES: usize = 512;

/// Pulls decoded audio from a media tap and runs it through the signal chain one
/// block at a time. This is what the output device actually plays.
pub struct RoutedSource {
    tap: Box<dyn AudioTap>,
    chain: Arc<Mutex<SignalChain>>,
    channels: u16,
    sample_rate: u32,
    block: Vec<f32>,
    position: usize,
    filled: usize,
    /// Samples after `filled` that don't yet make a whole frame.
    carry: usize,
}

impl RoutedSource {
    pub fn new(tap: Box<dyn AudioTap>, chain: Arc<Mutex<SignalChain>>) -> Self {
        let channels = tap.channels().max(1);
        let sample_rate = tap.sample_rate().max(1);
        Self {
            tap,
            chain,
            channels,
            sample_rate,
            block: vec![0.0; BLOCK_FRAMES * usize::from(channels)],
            position: 0,
            filled: 0,
            carry: 0,
        }
    }

    fn refill(&mut self) -> bool {
        let carry = self.carry;
        self.block.copy_within(self.filled..self.filled + carry, 0);

        let read = self.tap.read(&mut self.block[carry..]);
        if read == 0 {
            self.carry = 0;
            return false;
        }

        let total = carry + read;
        let whole = total - total % usize::from(self.channels);
        let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
        chain.process(&mut self.block[..whole]);
        drop(chain);

        self.position = 0;
        self.filled = whole;
        self.carry = total - whole;
        true
    }
}

impl Iterator for RoutedSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position >= self.filled {
            if !self.refill() {
                return None;
            }
        }
        let sample = self.block[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for RoutedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
