/// A plugin is initialized via [`Self::build`] which injects its resources and systems into the
/// application
pub trait Plugin {
    fn build(&self, app: &mut super::App);
}
