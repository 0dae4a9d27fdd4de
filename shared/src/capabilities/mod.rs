mod haptics;
mod http;
mod map;
mod navigator;
mod timer;

pub use self::haptics::{Haptics, HapticsOperation};
pub use self::http::{
    decode_body, decode_json, decode_json_optional, decode_optional, get_json, post_json,
    read_response, ApiError, HttpResponse, INCIDENTS_PATH, LOGIN_PATH, REGISTER_PATH,
};
pub use self::map::{MapOperation, MapView};
pub use self::navigator::{Navigator, NavigatorOperation};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;

// The Effect derive resolves the app type by this name.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub timer: Timer<Event>,
    pub haptics: Haptics<Event>,
    pub navigator: Navigator<Event>,
    pub map: MapView<Event>,
}
