mod circle;
mod ellipse;
mod line;
mod plane;

pub use circle::Circle2;
pub use ellipse::Ellipse3;
pub use line::Line;
pub use plane::Plane;
