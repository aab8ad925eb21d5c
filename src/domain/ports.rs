use crate::domain::model::Digest;
use crate::utils::error::Result;

/// Delivery capability for composed digests: either a live mail session or
/// a serializer writing one file per student.
pub trait Dispatcher {
    fn dispatch(&mut self, nick: &str, digest: &Digest) -> Result<()>;

    /// Ends the batch. Live sessions are closed here.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
