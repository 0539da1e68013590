pub mod icons;
pub mod render;

pub use render::{
    capacity_bar, render_breakdown, render_conversation, render_forecast, render_message,
    render_state, styled_tier, terminal_width,
};
