use crate::models::PositionReading;

/// Tracks the most accurate reading seen during one acquisition.
#[derive(Debug, Default, Clone)]
pub struct BestReading {
    best: Option<PositionReading>,
    offered: usize,
}

impl BestReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `reading` became the new best.
    pub fn offer(&mut self, reading: PositionReading) -> bool {
        self.offered += 1;
        let replace = match &self.best {
            None => true,
            Some(current) => reading.improves_on(current),
        };
        if replace {
            self.best = Some(reading);
        }
        replace
    }

    pub fn get(&self) -> Option<PositionReading> {
        self.best
    }

    pub fn offered(&self) -> usize {
        self.offered
    }
}
