//! Fixed-function lights and materials.

use cgmath::*;

use crate::backend::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;

/// Lights the fixed pipeline supports.
pub const MAX_LIGHTS: u32 = 8;

fn array4(v: Vector4<f32>) -> [f32; 4] {
    v.into()
}

fn array3(v: Vector3<f32>) -> [f32; 3] {
    v.into()
}

/// The light model and the global lighting switch.
pub struct Lighting<B: FixedFunctionBackend> {
    context: GlContext<B>,
}

impl<B: FixedFunctionBackend> Lighting<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        Lighting { context: context.clone() }
    }

    pub fn open(&self) {
        self.context.enable(GlFlag::Lighting);
    }

    pub fn close(&self) {
        self.context.disable(GlFlag::Lighting);
    }

    /// Ambient light present regardless of any individual light.
    pub fn global_ambient(&self, rgba: Vector4<f32>) {
        self.context.inner.light_model_fv(gl::LIGHT_MODEL_AMBIENT, &array4(rgba));
    }

    /// Computes specular reflections from the actual eye position.
    pub fn specular_from_viewer(&self) {
        self.context.inner.light_model_i32(gl::LIGHT_MODEL_LOCAL_VIEWER, gl::TRUE as GLint);
    }

    /// Computes specular reflections as if the eye were infinitely far down -Z. GL's default.
    pub fn specular_from_axis(&self) {
        self.context.inner.light_model_i32(gl::LIGHT_MODEL_LOCAL_VIEWER, gl::FALSE as GLint);
    }

    pub fn two_sided(&self) {
        self.context.inner.light_model_i32(gl::LIGHT_MODEL_TWO_SIDE, gl::TRUE as GLint);
    }

    pub fn front_face_only(&self) {
        self.context.inner.light_model_i32(gl::LIGHT_MODEL_TWO_SIDE, gl::FALSE as GLint);
    }

    pub fn single_color(&self) {
        self.context.inner.light_model_i32(gl::LIGHT_MODEL_COLOR_CONTROL, gl::SINGLE_COLOR as GLint);
    }

    /// Adds specular highlights after texturing.
    pub fn separate_specular_color(&self) {
        self.context
            .inner
            .light_model_i32(gl::LIGHT_MODEL_COLOR_CONTROL, gl::SEPARATE_SPECULAR_COLOR as GLint);
    }

    pub fn light(&self, index: u32) -> Light<B> {
        Light::new(&self.context, index)
    }
}

/// One of the fixed pipeline's lights, `LIGHT0` to `LIGHT7`.
pub struct Light<B: FixedFunctionBackend> {
    index: u32,
    context: GlContext<B>,
}

impl<B: FixedFunctionBackend> Light<B> {
    /// Panics if `index` is 8 or more.
    pub fn new(context: &GlContext<B>, index: u32) -> Self {
        assert!(index < MAX_LIGHTS, "light {} out of range (0..{})", index, MAX_LIGHTS);
        Light { index, context: context.clone() }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    fn id(&self) -> GLenum {
        gl::LIGHT0 + self.index
    }

    fn set(&self, pname: GLenum, params: &[f32]) {
        self.context.inner.light_fv(self.id(), pname, params);
    }

    pub fn open(&self) {
        self.context.enable(GlFlag::Light(self.index));
    }

    pub fn close(&self) {
        self.context.disable(GlFlag::Light(self.index));
    }

    pub fn ambient(&self, rgba: Vector4<f32>) {
        self.set(gl::AMBIENT, &array4(rgba));
    }

    pub fn diffuse(&self, rgba: Vector4<f32>) {
        self.set(gl::DIFFUSE, &array4(rgba));
    }

    pub fn specular(&self, rgba: Vector4<f32>) {
        self.set(gl::SPECULAR, &array4(rgba));
    }

    /// A directional light shining from `direction`, infinitely far away.
    pub fn sun_from(&self, direction: Vector3<f32>) {
        self.set(gl::POSITION, &array4(direction.extend(0.0)));
    }

    /// A positional light at `position`.
    pub fn spot_at(&self, position: Point3<f32>) {
        self.set(gl::POSITION, &array4(position.to_homogeneous()));
    }

    pub fn spot_direction(&self, direction: Vector3<f32>) {
        self.set(gl::SPOT_DIRECTION, &array3(direction));
    }

    /// Lights every direction equally (a cutoff of 180 degrees).
    pub fn spot_over_all(&self) {
        self.context.inner.light_i32(self.id(), gl::SPOT_CUTOFF, 180);
    }

    /// Half-angle of the spot cone in degrees, 0 to 90.
    pub fn spot_angle(&self, degrees: i32) {
        self.context.inner.light_i32(self.id(), gl::SPOT_CUTOFF, degrees);
    }

    /// Intensity falloff towards the edge of the cone, 0 to 128.
    pub fn spot_focus(&self, exponent: i32) {
        self.context.inner.light_i32(self.id(), gl::SPOT_EXPONENT, exponent);
    }

    /// Intensity is divided by `constant + linear * d + quadratic * d²`.
    pub fn attenuation(&self, constant: f32, linear: f32, quadratic: f32) {
        let inner = &self.context.inner;
        inner.light_f32(self.id(), gl::CONSTANT_ATTENUATION, constant);
        inner.light_f32(self.id(), gl::LINEAR_ATTENUATION, linear);
        inner.light_f32(self.id(), gl::QUADRATIC_ATTENUATION, quadratic);
    }
}

/// Switches between per-vertex colours and the material set through `front`/`back`/`both`.
pub struct Material<B: FixedFunctionBackend> {
    context: GlContext<B>,
}

impl<B: FixedFunctionBackend> Material<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        Material { context: context.clone() }
    }

    /// Vertex colours drive the properties picked by `apply_color_to_*`.
    pub fn use_color_material(&self) {
        self.context.enable(GlFlag::ColorMaterial);
    }

    pub fn use_material(&self) {
        self.context.disable(GlFlag::ColorMaterial);
    }

    pub fn front(&self) -> MaterialFace<'_, B> {
        MaterialFace { context: &self.context, face: gl::FRONT }
    }

    pub fn back(&self) -> MaterialFace<'_, B> {
        MaterialFace { context: &self.context, face: gl::BACK }
    }

    pub fn both(&self) -> MaterialFace<'_, B> {
        MaterialFace { context: &self.context, face: gl::FRONT_AND_BACK }
    }
}

const NO_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Material properties of one face. Every method returns `self` for chaining.
pub struct MaterialFace<'a, B: FixedFunctionBackend> {
    context: &'a GlContext<B>,
    face: GLenum,
}

impl<'a, B: FixedFunctionBackend> MaterialFace<'a, B> {
    fn set(&self, pname: GLenum, params: &[f32]) -> &Self {
        self.context.inner.material_fv(self.face, pname, params);
        self
    }

    fn apply_color_to(&self, mode: GLenum) -> &Self {
        self.context.inner.color_material(self.face, mode);
        self
    }

    pub fn ambient(&self, rgba: Vector4<f32>) -> &Self {
        self.set(gl::AMBIENT, &array4(rgba))
    }

    pub fn diffuse(&self, rgba: Vector4<f32>) -> &Self {
        self.set(gl::DIFFUSE, &array4(rgba))
    }

    pub fn specular(&self, rgba: Vector4<f32>) -> &Self {
        self.set(gl::SPECULAR, &array4(rgba))
    }

    pub fn emission(&self, rgba: Vector4<f32>) -> &Self {
        self.set(gl::EMISSION, &array4(rgba))
    }

    /// Specular exponent, 0 to 128.
    pub fn shininess(&self, exponent: i32) -> &Self {
        self.context.inner.material_i32(self.face, gl::SHININESS, exponent);
        self
    }

    pub fn without_ambient(&self) -> &Self {
        self.set(gl::AMBIENT, &NO_COLOR)
    }

    pub fn without_diffuse(&self) -> &Self {
        self.set(gl::DIFFUSE, &NO_COLOR)
    }

    pub fn without_specular(&self) -> &Self {
        self.set(gl::SPECULAR, &NO_COLOR)
    }

    pub fn without_emission(&self) -> &Self {
        self.set(gl::EMISSION, &NO_COLOR)
    }

    pub fn apply_color_to_ambient(&self) -> &Self {
        self.apply_color_to(gl::AMBIENT)
    }

    pub fn apply_color_to_diffuse(&self) -> &Self {
        self.apply_color_to(gl::DIFFUSE)
    }

    pub fn apply_color_to_specular(&self) -> &Self {
        self.apply_color_to(gl::SPECULAR)
    }

    pub fn apply_color_to_emission(&self) -> &Self {
        self.apply_color_to(gl::EMISSION)
    }

    pub fn apply_color_to_ambient_and_diffuse(&self) -> &Self {
        self.apply_color_to(gl::AMBIENT_AND_DIFFUSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::*;

    #[test]
    fn light_model_switches() {
        let context = recording_context(Profile::Desktop);
        let lighting = Lighting::new(&context);
        lighting.open();
        lighting.global_ambient(vec4(0.1, 0.1, 0.1, 1.0));
        lighting.specular_from_viewer();
        lighting.front_face_only();
        lighting.separate_specular_color();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::Enable(gl::LIGHTING),
                Call::LightModelFv(gl::LIGHT_MODEL_AMBIENT, vec![0.1, 0.1, 0.1, 1.0]),
                Call::LightModelI(gl::LIGHT_MODEL_LOCAL_VIEWER, gl::TRUE as GLint),
                Call::LightModelI(gl::LIGHT_MODEL_TWO_SIDE, gl::FALSE as GLint),
                Call::LightModelI(
                    gl::LIGHT_MODEL_COLOR_CONTROL,
                    gl::SEPARATE_SPECULAR_COLOR as GLint
                ),
            ]
        );
    }

    #[test]
    fn light_positions_carry_w() {
        let context = recording_context(Profile::Desktop);
        let light = Lighting::new(&context).light(3);
        light.open();
        light.sun_from(vec3(0.0, 1.0, 0.0));
        light.spot_at(Point3::new(1.0, 2.0, 3.0));
        light.spot_direction(vec3(0.0, 0.0, -1.0));
        light.spot_over_all();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::Enable(gl::LIGHT3),
                Call::LightFv(gl::LIGHT3, gl::POSITION, vec![0.0, 1.0, 0.0, 0.0]),
                Call::LightFv(gl::LIGHT3, gl::POSITION, vec![1.0, 2.0, 3.0, 1.0]),
                Call::LightFv(gl::LIGHT3, gl::SPOT_DIRECTION, vec![0.0, 0.0, -1.0]),
                Call::LightI(gl::LIGHT3, gl::SPOT_CUTOFF, 180),
            ]
        );
    }

    #[test]
    fn attenuation_sets_three_coefficients() {
        let context = recording_context(Profile::Desktop);
        Light::new(&context, 0).attenuation(1.0, 0.5, 0.25);
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::LightF(gl::LIGHT0, gl::CONSTANT_ATTENUATION, 1.0),
                Call::LightF(gl::LIGHT0, gl::LINEAR_ATTENUATION, 0.5),
                Call::LightF(gl::LIGHT0, gl::QUADRATIC_ATTENUATION, 0.25),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn light_eight_panics() {
        let context = recording_context(Profile::Desktop);
        Light::new(&context, 8);
    }

    #[test]
    fn material_faces_chain() {
        let context = recording_context(Profile::Desktop);
        let material = Material::new(&context);
        material.use_color_material();
        material.front().apply_color_to_ambient_and_diffuse().without_emission().shininess(64);
        material.both().specular(vec4(1.0, 1.0, 1.0, 1.0));
        material.use_material();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::Enable(gl::COLOR_MATERIAL),
                Call::ColorMaterial(gl::FRONT, gl::AMBIENT_AND_DIFFUSE),
                Call::MaterialFv(gl::FRONT, gl::EMISSION, vec![0.0, 0.0, 0.0, 1.0]),
                Call::MaterialI(gl::FRONT, gl::SHININESS, 64),
                Call::MaterialFv(gl::FRONT_AND_BACK, gl::SPECULAR, vec![1.0, 1.0, 1.0, 1.0]),
                Call::Disable(gl::COLOR_MATERIAL),
            ]
        );
    }
}
