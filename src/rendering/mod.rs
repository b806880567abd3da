pub mod canvas;
pub mod hotel_form;
pub mod information_form;

pub use hotel_form::{render_hotel_form, HotelForm};
pub use information_form::render_information_form;
