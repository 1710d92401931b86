//! GLSL ES 1.00 sources for the flat red Lambert shading.
//!
//! Attribute and uniform names are looked up by [`crate::backend`].

pub const VERTEX_SHADER: &str = r#"
attribute vec4 a_position;
attribute vec3 a_normal;

uniform mat4 u_modelViewMatrix;
uniform mat4 u_projectionMatrix;
uniform mat3 u_normalMatrix;

varying vec3 v_normal;
varying vec3 v_position;

void main() {
    vec4 viewPosition = u_modelViewMatrix * a_position;
    gl_Position = u_projectionMatrix * viewPosition;
    v_position = viewPosition.xyz;
    v_normal = normalize(u_normalMatrix * a_normal);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
precision mediump float;

uniform vec3 u_lightPosition;
uniform vec3 u_lightColor;
uniform vec3 u_ambientColor;
uniform vec3 u_baseColor;

varying vec3 v_normal;
varying vec3 v_position;

void main() {
    vec3 L = normalize(u_lightPosition - v_position);
    vec3 N = normalize(v_normal);
    float diffuse = max(dot(L, N), 0.0);

    vec3 ambient = u_ambientColor * u_baseColor;
    vec3 diffuseColor = u_lightColor * u_baseColor * diffuse;

    gl_FragColor = vec4(ambient + diffuseColor, 1.0);
}
"#;

pub const ATTRIB_POSITION: &str = "a_position";
pub const ATTRIB_NORMAL: &str = "a_normal";

pub const UNIFORM_MODEL_VIEW: &str = "u_modelViewMatrix";
pub const UNIFORM_PROJECTION: &str = "u_projectionMatrix";
pub const UNIFORM_NORMAL: &str = "u_normalMatrix";
pub const UNIFORM_LIGHT_POSITION: &str = "u_lightPosition";
pub const UNIFORM_LIGHT_COLOR: &str = "u_lightColor";
pub const UNIFORM_AMBIENT_COLOR: &str = "u_ambientColor";
pub const UNIFORM_BASE_COLOR: &str = "u_baseColor";
