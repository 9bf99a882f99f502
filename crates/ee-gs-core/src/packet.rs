//! Command packets and the two-packet double buffer.
//!
//! A packet is a fixed-capacity buffer of 64-bit words: a leading transfer
//! descriptor slot followed by tagged command qwords. Exactly one of the two
//! packets is writable at any time; the other is assumed to still be
//! draining to the transfer unit. The write cursor resets to just past the
//! descriptor on every flip.

use crate::gif::{self, Qword};

/// A write would exceed the packet's fixed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketFull {
    pub needed: usize,
    pub remaining: usize,
}

/// Words occupied by the leading transfer descriptor.
pub const HEADER_WORDS: usize = 2;

pub struct Packet {
    words: Vec<u64>,
    capacity_words: usize,
}

impl Packet {
    /// Allocate a packet holding `capacity_qwords` command qwords plus the
    /// descriptor header.
    pub fn new(capacity_qwords: usize) -> Self {
        let capacity_words = capacity_qwords * 2 + HEADER_WORDS;
        let mut packet = Self {
            words: Vec::with_capacity(capacity_words),
            capacity_words,
        };
        packet.reset();
        packet
    }

    /// Reset the write cursor to just past the descriptor header.
    pub fn reset(&mut self) {
        self.words.clear();
        self.words.extend_from_slice(&[0, 0]);
    }

    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    pub fn remaining_words(&self) -> usize {
        self.capacity_words - self.words.len()
    }

    /// Command payload length in qwords, excluding the descriptor.
    pub fn payload_qwords(&self) -> usize {
        (self.words.len() - HEADER_WORDS) / 2
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    fn check(&self, needed: usize) -> Result<(), PacketFull> {
        let remaining = self.remaining_words();
        if needed > remaining {
            return Err(PacketFull { needed, remaining });
        }
        Ok(())
    }

    pub fn push_qword(&mut self, q: Qword) -> Result<(), PacketFull> {
        self.check(2)?;
        self.words.push(q.lo);
        self.words.push(q.hi);
        Ok(())
    }

    /// Push a single 64-bit word (register-list payloads are dword granular;
    /// callers pad back to qword alignment before finalizing).
    pub fn push_dword(&mut self, w: u64) -> Result<(), PacketFull> {
        self.check(1)?;
        self.words.push(w);
        Ok(())
    }

    /// Push one address+data register write (a tag plus one data qword).
    pub fn push_reg(&mut self, reg: u64, data: u64) -> Result<(), PacketFull> {
        self.check(4)?;
        self.push_qword(gif::ad_tag(1))?;
        self.push_qword(Qword::new(data, reg))?;
        Ok(())
    }

    /// Write the terminating transfer descriptor recording the payload
    /// length. The packet must be qword aligned.
    pub fn finalize(&mut self) {
        debug_assert!(self.words.len() % 2 == 0, "packet not qword aligned");
        let tag = gif::dma_end_tag(self.payload_qwords() as u64);
        self.words[0] = tag.lo;
        self.words[1] = tag.hi;
    }
}

/// Ownership state of one packet in the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketState {
    /// CPU-writable.
    Filling,
    /// Handed to the transfer unit; must not be touched until the next flip,
    /// by which point the submission wait has confirmed it drained.
    InFlight,
}

/// The two-packet ring. Flipping is a pure state transition: the filling
/// packet becomes in-flight and the other becomes writable with its cursor
/// reset.
pub struct PacketRing {
    packets: [Packet; 2],
    states: [PacketState; 2],
    active: usize,
}

impl PacketRing {
    pub fn new(capacity_qwords: usize) -> Self {
        Self {
            packets: [Packet::new(capacity_qwords), Packet::new(capacity_qwords)],
            states: [PacketState::InFlight, PacketState::Filling],
            active: 1,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn state(&self, index: usize) -> PacketState {
        self.states[index]
    }

    pub fn active(&self) -> &Packet {
        &self.packets[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Packet {
        &mut self.packets[self.active]
    }

    pub fn flip(&mut self) {
        self.states[self.active] = PacketState::InFlight;
        self.active ^= 1;
        self.states[self.active] = PacketState::Filling;
        self.packets[self.active].reset();
    }
}
