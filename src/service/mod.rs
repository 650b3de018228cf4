//! TodoService: store operations behind the todo handlers.

mod todo;
pub use todo::TodoService;
