pub mod helpers;
pub mod test_world;

pub use helpers::*;
pub use local_socket::{LocalNetwork, LocalSocket};
pub use test_world::{RecordingSolver, SolverLog, TestWorld, AVATAR, SCORE};
