pub mod catalog_handler;

pub use catalog_handler::{
    __path_get_service, __path_list_categories, __path_list_centers, __path_list_services,
    get_service, list_categories, list_centers, list_services,
};
