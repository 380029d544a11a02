//! MatrixPublisher: writes the keyboard matrix to the fabric only on change.
//!
//! Bus time is expensive relative to the host's key-repeat rate, so an
//! unchanged bitmap costs nothing.  A changed bitmap is written as one full
//! eight-row transfer; rows are never written individually.

use std::sync::Arc;

use fabric_bridge_core::MatrixBitmap;
use tracing::debug;

use crate::application::bus_arbiter::{BusArbiter, BusError, Excursion};

pub struct MatrixPublisher {
    arbiter: Arc<BusArbiter>,
    /// Last bitmap whose write completed.  `None` until the first write.
    published: Option<MatrixBitmap>,
}

impl MatrixPublisher {
    pub fn new(arbiter: Arc<BusArbiter>) -> Self {
        Self {
            arbiter,
            published: None,
        }
    }

    /// Publishes `bitmap` if it differs from the last one written.
    ///
    /// Returns `true` if a fabric write happened.  The stored comparison
    /// value only changes after the write succeeds, so a failed write is
    /// retried by the next call.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus is held or the transfer fails.
    pub fn publish(&mut self, bitmap: MatrixBitmap) -> Result<bool, BusError> {
        if self.published == Some(bitmap) {
            return Ok(false);
        }
        let bus = self.arbiter.acquire(Excursion::MatrixUpdate)?;
        bus.write_keyboard_matrix(bitmap.as_bytes())?;
        bus.release()?;
        debug!(?bitmap, "matrix published");
        self.published = Some(bitmap);
        Ok(true)
    }

    pub fn published(&self) -> Option<MatrixBitmap> {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bus_arbiter::FabricBus;
    use crate::infrastructure::fabric::mock::MockFabric;

    fn make_publisher(fabric: &Arc<MockFabric>) -> MatrixPublisher {
        let arbiter = BusArbiter::new(Arc::clone(fabric) as Arc<dyn FabricBus>);
        MatrixPublisher::new(Arc::new(arbiter))
    }

    fn bitmap(first_row: u8) -> MatrixBitmap {
        let mut rows = [0xFF; 8];
        rows[0] = first_row;
        MatrixBitmap::from_bytes(rows)
    }

    #[test]
    fn test_publishing_same_bitmap_twice_writes_once() {
        // Arrange
        let fabric = Arc::new(MockFabric::new(1));
        let mut publisher = make_publisher(&fabric);

        // Act
        let first = publisher.publish(bitmap(0xFE)).unwrap();
        let second = publisher.publish(bitmap(0xFE)).unwrap();

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(fabric.matrix_writes().len(), 1);
    }

    #[test]
    fn test_write_sequence_for_x_x_y_is_x_y() {
        let fabric = Arc::new(MockFabric::new(1));
        let mut publisher = make_publisher(&fabric);
        let (x, y) = (bitmap(0xFE), bitmap(0xFD));

        publisher.publish(x).unwrap();
        publisher.publish(x).unwrap();
        publisher.publish(y).unwrap();

        assert_eq!(fabric.matrix_writes(), vec![*x.as_bytes(), *y.as_bytes()]);
        assert_eq!(publisher.published(), Some(y));
    }

    #[test]
    fn test_first_publish_always_writes_even_when_idle() {
        let fabric = Arc::new(MockFabric::new(1));
        let mut publisher = make_publisher(&fabric);
        assert!(publisher.publish(MatrixBitmap::RELEASED).unwrap());
    }

    #[test]
    fn test_failed_write_does_not_update_published_value() {
        let fabric = Arc::new(MockFabric::failing(1));
        let mut publisher = make_publisher(&fabric);

        let result = publisher.publish(bitmap(0x00));

        assert!(matches!(result, Err(BusError::Fabric(_))));
        assert_eq!(publisher.published(), None);
    }

    #[test]
    fn test_publish_while_bus_held_is_rejected() {
        let fabric = Arc::new(MockFabric::new(1));
        let arbiter = Arc::new(BusArbiter::new(Arc::clone(&fabric) as Arc<dyn FabricBus>));
        let mut publisher = MatrixPublisher::new(Arc::clone(&arbiter));
        let _verify = arbiter.acquire(Excursion::Verify).unwrap();

        let result = publisher.publish(bitmap(0xFE));

        assert!(matches!(result, Err(BusError::AlreadyHeld { .. })));
        assert!(fabric.matrix_writes().is_empty());
    }
}
