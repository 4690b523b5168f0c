pub mod delete;
pub mod edit;
pub mod list;
pub mod new;
pub mod show;

pub use delete::handle_delete;
pub use edit::handle_edit;
pub use list::handle_list;
pub use new::handle_new;
pub use show::handle_show;
