/// Contents written by `pullcdn --init`.
pub fn generate_init_template() -> String {
	r#"# pullcdn settings. Files are looked up from the working directory upwards,
# then in ~/.pullcdn.toml. The most specific file that sets a key wins.

# Stop looking in parent directories after this file.
root = true

# CDN hostname, no scheme. Rewriting is off while this is empty.
cdn-host = ""

# "on": only rewrite files under the upload directory.
# "off": rewrite every matching asset on the site.
uploads = "on"

# The site's home URL. Its host is treated as "this site" in "off" mode.
site-url = "https://example.com"

# Upload storage base URL. Defaults to <site-url>/wp-content/uploads.
# uploads-url = "https://example.com/wp-content/uploads"

# File extensions to rewrite (regex fragments).
# extensions = ["jpe?g", "gif", "png", "css", "bmp", "js", "ico"]

# Set to true to turn rewriting off without losing the settings above.
# disabled = false
"#
	.to_string()
}
