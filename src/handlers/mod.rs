//! Operations exposed to the command line. Each one takes a connection and,
//! where it acts on behalf of someone, the already-resolved user.

pub mod feeds;
pub mod follows;
pub mod posts;
pub mod users;
