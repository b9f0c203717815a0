//! HTML pages: the upload form plus the success and error pages.
//!
//! The form keeps the legacy-browser constraints of the original page it
//! replaces: no fetch(), no arrow functions, one XHR request per selected
//! file, so old iOS/Android WebKit builds can still post.

use axum::response::Html;

/// GET `/` — the upload form. Exact-path match; the router's fallback
/// answers everything else with 404.
pub async fn home() -> Html<&'static str> {
    Html(FORM_PAGE)
}

pub fn success_page(original_name: &str, stored_name: &str) -> String {
    let message = format!(
        r#"File '{}' uploaded successfully! <a href="/uploads/{}">View file</a>"#,
        escape_html(original_name),
        escape_html(stored_name)
    );
    render_result_page("Upload complete", "success", &message, "&larr; Upload more")
}

pub fn error_page(message: &str) -> String {
    render_result_page("Upload failed", "error", &escape_html(message), "&larr; Back")
}

fn render_result_page(title: &str, kind: &str, message: &str, link_text: &str) -> String {
    RESULT_PAGE
        .replace("{title}", title)
        .replace("{kind}", kind)
        .replace("{message}", message)
        .replace("{link}", link_text)
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const RESULT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            text-align: center;
        }
        .success {
            background-color: #d4edda;
            color: #155724;
            border: 1px solid #c3e6cb;
            padding: 15px;
            border-radius: 8px;
            margin: 20px 0;
        }
        .error {
            background-color: #f8d7da;
            color: #721c24;
            border: 1px solid #f5c6cb;
            padding: 15px;
            border-radius: 8px;
            margin: 20px 0;
        }
        .back-btn {
            background-color: #007AFF;
            color: white;
            border: none;
            padding: 12px 24px;
            border-radius: 8px;
            font-size: 16px;
            cursor: pointer;
            text-decoration: none;
            display: inline-block;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <div class="{kind}">{message}</div>
        <a href="/" class="back-btn">{link}</a>
    </div>
</body>
</html>"#;

const FORM_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no">
    <meta name="format-detection" content="telephone=no">
    <meta name="apple-mobile-web-app-capable" content="yes">
    <title>File upload</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            text-align: center;
            margin-bottom: 30px;
        }
        .upload-form {
            text-align: center;
        }
        .file-input {
            position: absolute;
            left: -9999px;
        }
        .file-input-label {
            display: inline-block;
            padding: 12px 24px;
            background-color: #007AFF;
            color: white;
            border-radius: 8px;
            cursor: pointer;
            font-size: 16px;
        }
        .submit-btn {
            background-color: #34C759;
            color: white;
            border: none;
            padding: 12px 24px;
            border-radius: 8px;
            font-size: 16px;
            cursor: pointer;
            margin-top: 20px;
        }
        .submit-btn:disabled {
            background-color: #ccc;
            cursor: not-allowed;
        }
        .file-info {
            margin: 10px 0;
            font-size: 14px;
            color: #666;
        }
        .progress {
            width: 100%;
            height: 20px;
            background-color: #f0f0f0;
            border-radius: 10px;
            overflow: hidden;
            margin: 20px 0;
            display: none;
        }
        .progress-bar {
            height: 100%;
            background-color: #007AFF;
            width: 0%;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>File upload</h1>
        <p style="text-align: center; color: #666;">Pick one or more files to upload</p>

        <form class="upload-form" action="/upload" method="post" enctype="multipart/form-data" id="uploadForm">
            <input type="file" name="photo" id="photos" class="file-input" multiple required>
            <label for="photos" class="file-input-label">Choose files</label>

            <div class="file-info" id="fileInfo" style="display: none;"></div>

            <div class="progress" id="progress">
                <div class="progress-bar" id="progressBar"></div>
            </div>
            <div id="progressText" style="text-align: center; font-size: 14px; color: #666;"></div>

            <div><button type="submit" class="submit-btn" id="submitBtn">Upload</button></div>
        </form>
    </div>

    <script>
        function formatFileSize(bytes) {
            if (bytes === 0) return '0 Bytes';
            var k = 1024;
            var sizes = ['Bytes', 'KB', 'MB', 'GB'];
            var i = Math.floor(Math.log(bytes) / Math.log(k));
            return parseFloat((bytes / Math.pow(k, i)).toFixed(2)) + ' ' + sizes[i];
        }

        document.getElementById('photos').addEventListener('change', function (e) {
            var files = e.target.files;
            var fileInfo = document.getElementById('fileInfo');
            if (files && files.length > 0) {
                var totalSize = 0;
                for (var i = 0; i < files.length; i++) {
                    totalSize += files[i].size;
                }
                var label = files.length === 1 ? files[0].name : files.length + ' files selected';
                fileInfo.textContent = label + ' (' + formatFileSize(totalSize) + ')';
                fileInfo.style.display = 'block';
            } else {
                fileInfo.style.display = 'none';
            }
        });

        document.getElementById('uploadForm').addEventListener('submit', function (e) {
            e.preventDefault();

            var files = document.getElementById('photos').files;
            if (files.length === 0) {
                alert('Pick files to upload first');
                return;
            }

            var submitBtn = document.getElementById('submitBtn');
            var progress = document.getElementById('progress');
            var progressBar = document.getElementById('progressBar');
            var progressText = document.getElementById('progressText');

            submitBtn.disabled = true;
            submitBtn.textContent = 'Uploading...';
            progress.style.display = 'block';

            var uploadedCount = 0;
            var totalFiles = files.length;
            var errors = [];

            function finish() {
                submitBtn.disabled = false;
                submitBtn.textContent = 'Upload';
                progressText.textContent = 'Upload finished';
                if (errors.length === 0) {
                    alert('All files uploaded');
                    window.location.reload();
                } else {
                    alert('Finished with errors:\n' + errors.join('\n'));
                }
            }

            function uploadFile(file) {
                var formData = new FormData();
                formData.append('photo', file);

                var xhr = new XMLHttpRequest();
                xhr.open('POST', '/upload', true);

                xhr.onload = function () {
                    uploadedCount++;
                    progressBar.style.width = (uploadedCount / totalFiles) * 100 + '%';
                    progressText.textContent = 'Uploaded ' + uploadedCount + ' of ' + totalFiles;
                    if (xhr.status !== 200) {
                        errors.push('Upload failed: ' + file.name);
                    }
                    if (uploadedCount === totalFiles) {
                        finish();
                    }
                };

                xhr.onerror = function () {
                    uploadedCount++;
                    errors.push('Network error: ' + file.name);
                    if (uploadedCount === totalFiles) {
                        finish();
                    }
                };

                xhr.send(formData);
            }

            for (var i = 0; i < files.length; i++) {
                uploadFile(files[i]);
            }
        });
    </script>
</body>
</html>"#;
