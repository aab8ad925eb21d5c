// Concrete collaborators: roster files, MIME rendering and the two digest transports.

pub mod mail;
pub mod outbox;
pub mod roster;
pub mod smtp;
