//! GLSL 300 es sources for the fluted-glass pass.
//!
//! The fragment stage is mirrored formula-for-formula by [`crate::flute`];
//! keep the two in sync when touching either.

/// Full-screen triangle passthrough; UV derived from clip-space position.
pub const VERTEX_SHADER: &str = r#"#version 300 es
precision highp float;
in vec2 a_position;
out vec2 v_uv;

void main() {
  v_uv = a_position * 0.5 + 0.5;
  gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

in vec2 v_uv;
out vec4 fragColor;

uniform sampler2D u_image;
uniform sampler2D u_grainTexture;
uniform float u_imageAspect;
uniform vec2 u_resolution;
uniform float u_size;
uniform float u_distortion;
uniform float u_shift;
uniform float u_margin;
uniform float u_shadow;
uniform float u_grainIntensity;
uniform vec2 u_stretch;
uniform float u_blur;

vec2 coverUV(vec2 uv) {
  float imgRatio = u_imageAspect;
  float screenRatio = u_resolution.x / u_resolution.y;
  vec2 outUV = uv;
  if (imgRatio > screenRatio) {
    float sx = screenRatio / imgRatio;
    outUV.x = (uv.x - 0.5) * sx + 0.5;
  } else {
    float sy = imgRatio / screenRatio;
    outUV.y = (uv.y - 0.5) * sy + 0.5;
  }
  return outUV;
}

vec4 blur9(sampler2D tex, vec2 uv, float amount) {
  if (amount <= 0.0) {
    return texture(tex, uv);
  }
  vec4 color = vec4(0.0);
  float blurSize = amount * 0.01;
  float total = 0.0;
  for (float x = -1.0; x <= 1.0; x += 1.0) {
    for (float y = -1.0; y <= 1.0; y += 1.0) {
      color += texture(tex, uv + vec2(x, y) * blurSize);
      total += 1.0;
    }
  }
  return color / total;
}

void main() {
  vec2 imgUV = coverUV(v_uv);

  float m = clamp(u_margin, 0.0, 0.49);

  // margin band: undistorted frame, grain still applies
  if (v_uv.x < m || v_uv.x > 1.0 - m || v_uv.y < m || v_uv.y > 1.0 - m) {
    vec4 color = texture(u_image, imgUV);
    if (u_grainIntensity > 0.0) {
      float grainValue = texture(u_grainTexture, v_uv).r;
      color.rgb += (grainValue - 0.5) * u_grainIntensity;
    }
    fragColor = color;
    return;
  }

  vec2 stretchedUV = v_uv;
  stretchedUV.y = (v_uv.y - 0.5) / (1.0 + u_stretch.y) + 0.5;
  imgUV = coverUV(stretchedUV);

  // empirically tuned density curve; mirrored in flute::effect_size
  float effectSize = 1.0 / pow(0.7 * (u_size + 0.5), 6.0);
  float stripeCount = effectSize;

  float coord = imgUV.x * stripeCount;
  float stripeIndex = floor(coord);
  float fracInStripe = fract(coord);

  float base = -pow(1.5 * fracInStripe, 3.0) + (0.5 + u_shift);
  float xDist = 0.5 + (base - 0.5) * u_distortion;

  float sampledX = (stripeIndex + xDist) / stripeCount;
  sampledX = clamp(sampledX, 0.0, 1.0);

  vec2 sampledUV = vec2(sampledX, imgUV.y);

  vec4 color;
  if (u_blur > 0.0) {
    color = blur9(u_image, sampledUV, u_blur * 7.0);
  } else {
    color = texture(u_image, sampledUV);
  }

  float shadowStrength = abs(base - 0.5) * (u_shadow * 0.3);
  color.rgb *= (1.0 - shadowStrength);

  if (u_grainIntensity > 0.0) {
    float grainValue = texture(u_grainTexture, v_uv).r;
    color.rgb += (grainValue - 0.5) * u_grainIntensity;
  }

  fragColor = color;
}
"#;
