//! Command implementations for the suarc CLI.

pub mod decompress;
pub mod info;
pub mod link;
pub mod list;
pub mod merge;
pub mod pack;
pub mod unpack;

pub use decompress::cmd_decompress;
pub use info::cmd_info;
pub use link::cmd_link;
pub use list::cmd_list;
pub use merge::cmd_merge;
pub use pack::cmd_pack;
pub use unpack::cmd_unpack;
