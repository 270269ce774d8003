/// Interaction prompt shown while the player faces an interactable.
pub trait PromptPanel {
    fn show(&mut self, text: &str);
    fn hide(&mut self);
}

/// Concentration slider.
pub trait ConcentrationGauge {
    fn configure(&mut self, max: f32, value: f32);
    fn set_value(&mut self, value: f32);
}

/// Retained prompt state for frontends that poll instead of being pushed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    visible: bool,
    text: String,
    show_count: u32,
    hide_count: u32,
}

impl PromptState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> Option<&str> {
        self.visible.then_some(self.text.as_str())
    }

    pub fn show_count(&self) -> u32 {
        self.show_count
    }

    pub fn hide_count(&self) -> u32 {
        self.hide_count
    }
}

impl PromptPanel for PromptState {
    fn show(&mut self, text: &str) {
        self.visible = true;
        self.text.clear();
        self.text.push_str(text);
        self.show_count = self.show_count.saturating_add(1);
    }

    fn hide(&mut self) {
        self.visible = false;
        self.hide_count = self.hide_count.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaugeState {
    pub max: f32,
    pub value: f32,
}

impl GaugeState {
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.value / self.max).clamp(0.0, 1.0)
        }
    }
}

impl ConcentrationGauge for GaugeState {
    fn configure(&mut self, max: f32, value: f32) {
        self.max = max;
        self.value = value;
    }

    fn set_value(&mut self, value: f32) {
        self.value = value;
    }
}
