mod work_item;
mod work_item_type;

pub use work_item::*;
pub use work_item_type::*;
