use crate::{Mat4, Vec2, Vec3};

/// Movement requested for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Mouse motion in pixels since the previous frame (+x right, +y down).
    pub mouse_delta: Vec2,
}

/// Free-fly perspective camera (right-handed, OpenGL clip space).
///
/// Yaw 0 looks down +Z; yaw PI looks down -Z. Pitch is clamped just short of
/// straight up/down so the view basis never degenerates.
#[derive(Clone, Copy, Debug)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
    /// Units per second.
    pub speed: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_speed: f32,
}

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

impl FlyCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov_y_rad: 45f32.to_radians(),
            z_near: 0.1,
            z_far: 500.0,
            aspect: 4.0 / 3.0,
            speed: 3.0,
            mouse_speed: 0.005,
        }
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn direction(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
    }

    pub fn right(&self) -> Vec3 {
        let yaw = self.yaw - std::f32::consts::FRAC_PI_2;
        Vec3::new(yaw.sin(), 0.0, yaw.cos())
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.direction())
    }

    /// Apply one frame of input scaled by `dt` seconds.
    pub fn update(&mut self, input: &CameraInput, dt: f32) {
        self.yaw -= self.mouse_speed * input.mouse_delta.x;
        self.pitch = (self.pitch - self.mouse_speed * input.mouse_delta.y)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let step = self.speed * dt;
        let direction = self.direction();
        let right = self.right();
        if input.forward {
            self.position += direction * step;
        }
        if input.backward {
            self.position -= direction * step;
        }
        if input.right {
            self.position += right * step;
        }
        if input.left {
            self.position -= right * step;
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction(), self.up())
    }

    /// OpenGL-style projection (z in [-1, 1]).
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj() * self.view()
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), std::f32::consts::PI, 0.0)
    }
}
