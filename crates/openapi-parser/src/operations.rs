//! Operation extraction from OpenAPI specs

use crate::error::ParseResult;
use crate::resolver::SchemaResolver;
use crate::types::*;
use indexmap::IndexMap;

const PARAMETER_PREFIX: &str = "#/components/parameters/";

/// Extracts operations from raw OpenAPI spec structures
pub struct OperationExtractor;

impl OperationExtractor {
    /// Extract all operations from a raw OpenAPI spec, in declaration order
    pub fn extract(spec: &RawOpenApiSpec) -> ParseResult<Vec<ApiOperation>> {
        let mut operations = Vec::new();

        let empty_schemas = IndexMap::new();
        let empty_params = IndexMap::new();
        let (schemas, shared_params) = spec
            .components
            .as_ref()
            .map(|c| (&c.schemas, &c.parameters))
            .unwrap_or((&empty_schemas, &empty_params));
        let resolver = SchemaResolver::new(schemas);

        for (path, path_item) in &spec.paths {
            let path_params: Vec<OperationParameter> = path_item
                .parameters
                .iter()
                .filter_map(|p| Self::convert_parameter(p, shared_params, &resolver))
                .collect();

            let methods = [
                (HttpMethod::Get, &path_item.get),
                (HttpMethod::Post, &path_item.post),
                (HttpMethod::Put, &path_item.put),
                (HttpMethod::Patch, &path_item.patch),
                (HttpMethod::Delete, &path_item.delete),
                (HttpMethod::Head, &path_item.head),
                (HttpMethod::Options, &path_item.options),
                (HttpMethod::Trace, &path_item.trace),
            ];

            for (method, operation) in methods {
                if let Some(op) = operation {
                    operations.push(Self::extract_operation(
                        path,
                        method,
                        op,
                        &path_params,
                        shared_params,
                        spec,
                        &resolver,
                    ));
                }
            }
        }

        Ok(operations)
    }

    fn extract_operation(
        path: &str,
        method: HttpMethod,
        operation: &RawOperation,
        path_params: &[OperationParameter],
        shared_params: &IndexMap<String, RawParameter>,
        spec: &RawOpenApiSpec,
        resolver: &SchemaResolver,
    ) -> ApiOperation {
        let operation_id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| Self::generate_operation_id(path, method));

        // Operation-level parameters override path-level ones with the same name
        let mut parameters = path_params.to_vec();
        for param in &operation.parameters {
            if let Some(p) = Self::convert_parameter(param, shared_params, resolver) {
                parameters.retain(|existing| existing.name != p.name);
                parameters.push(p);
            }
        }

        let request_body = operation
            .request_body
            .as_ref()
            .and_then(|body| Self::extract_request_body(body, resolver));

        let responses = Self::extract_responses(&operation.responses, resolver);

        let security = Self::extract_security(operation.security.as_ref(), &spec.security);

        ApiOperation {
            operation_id,
            method,
            path: path.to_string(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            deprecated: operation.deprecated,
            parameters,
            request_body,
            responses,
            security,
        }
    }

    /// Generate an operation ID from path and method
    fn generate_operation_id(path: &str, method: HttpMethod) -> String {
        // /v1/chat/{model} -> post_v1_chat_model
        let path_part = path
            .trim_start_matches('/')
            .replace('/', "_")
            .replace(['{', '}'], "");

        format!("{}_{}", method.as_str().to_lowercase(), path_part)
    }

    /// Convert a raw parameter, following a `#/components/parameters/` reference
    fn convert_parameter(
        param: &RawParameter,
        shared_params: &IndexMap<String, RawParameter>,
        resolver: &SchemaResolver,
    ) -> Option<OperationParameter> {
        let param = match &param.reference {
            Some(reference) => {
                let name = reference.strip_prefix(PARAMETER_PREFIX)?;
                let target = shared_params.get(name)?;
                // Nested parameter refs are not followed
                if target.reference.is_some() {
                    return None;
                }
                target
            }
            None => param,
        };

        let location = match param.location.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            _ => return None,
        };

        Some(OperationParameter {
            name: param.name.clone(),
            location,
            required: param.required || location == ParameterLocation::Path,
            description: param.description.clone(),
            schema: param.schema.as_ref().map(|s| resolver.resolve(s)),
            example: param.example.clone(),
        })
    }

    /// Pick the JSON media type if present, else the first declared one
    fn pick_media(content: &IndexMap<String, RawMediaType>) -> Option<(&String, &RawMediaType)> {
        content
            .iter()
            .find(|(ct, _)| ct.contains("json"))
            .or_else(|| content.first())
    }

    /// Request bodies are only usable as JSON; `*/*` is accepted as JSON
    fn pick_request_media(content: &IndexMap<String, RawMediaType>) -> Option<(&String, &RawMediaType)> {
        content
            .iter()
            .find(|(ct, _)| ct.contains("json"))
            .or_else(|| content.iter().find(|(ct, _)| ct.as_str() == "*/*"))
    }

    fn extract_request_body(body: &RawRequestBody, resolver: &SchemaResolver) -> Option<RequestBody> {
        let (content_type, media) = Self::pick_request_media(&body.content)?;

        Some(RequestBody {
            required: body.required,
            content_type: content_type.clone(),
            schema: media.schema.as_ref().map(|s| resolver.resolve(s)),
            description: body.description.clone(),
        })
    }

    fn extract_responses(
        responses: &IndexMap<String, RawResponse>,
        resolver: &SchemaResolver,
    ) -> Vec<ResponseSchema> {
        responses
            .iter()
            .map(|(status, response)| {
                let (content_type, schema) = response
                    .content
                    .as_ref()
                    .and_then(Self::pick_media)
                    .map(|(ct, media)| {
                        (Some(ct.clone()), media.schema.as_ref().map(|s| resolver.resolve(s)))
                    })
                    .unwrap_or((None, None));

                ResponseSchema {
                    status_code: status.clone(),
                    content_type,
                    schema,
                    description: response.description.clone(),
                }
            })
            .collect()
    }

    /// Operation-level security replaces the global requirements when present
    fn extract_security(
        operation_security: Option<&Vec<IndexMap<String, Vec<String>>>>,
        global_security: &[IndexMap<String, Vec<String>>],
    ) -> Vec<SecurityRequirement> {
        let security: &[IndexMap<String, Vec<String>>] = operation_security
            .map(|v| v.as_slice())
            .unwrap_or(global_security);

        security
            .iter()
            .flat_map(|req| {
                req.iter().map(|(name, scopes)| SecurityRequirement {
                    scheme_name: name.clone(),
                    scopes: scopes.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r##"
openapi: "3.0.0"
info:
  title: Messages API
  version: "1"
paths:
  /v1/messages:
    parameters:
      - $ref: "#/components/parameters/Version"
    post:
      parameters:
        - name: x-trace
          in: header
          schema:
            type: string
      requestBody:
        content:
          text/plain:
            schema:
              type: string
          application/json:
            schema:
              $ref: "#/components/schemas/Request"
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Response"
components:
  parameters:
    Version:
      name: anthropic-version
      in: header
      required: true
      schema:
        type: string
        example: "2023-06-01"
  schemas:
    Request:
      type: object
      properties:
        prompt:
          type: string
    Response:
      type: object
      properties:
        text:
          type: string
"##;

    fn extract() -> Vec<ApiOperation> {
        let raw: RawOpenApiSpec = serde_yaml::from_str(SPEC).unwrap();
        OperationExtractor::extract(&raw).unwrap()
    }

    #[test]
    fn test_generate_operation_id() {
        assert_eq!(
            OperationExtractor::generate_operation_id("/v1/chat/{model}", HttpMethod::Post),
            "post_v1_chat_model"
        );
    }

    #[test]
    fn test_parameter_refs_are_resolved() {
        let ops = extract();
        let op = &ops[0];
        assert_eq!(op.parameters.len(), 2);

        let version = op.required_headers().next().unwrap();
        assert_eq!(version.name, "anthropic-version");
        assert_eq!(version.example_value().unwrap(), "2023-06-01");
    }

    #[test]
    fn test_request_and_response_schemas_are_resolved() {
        let ops = extract();
        let op = &ops[0];

        assert_eq!(op.request_body.as_ref().unwrap().content_type, "application/json");
        assert_eq!(op.request_schema().unwrap()["properties"]["prompt"]["type"], "string");
        assert_eq!(op.response_schema().unwrap()["properties"]["text"]["type"], "string");
    }

    #[test]
    fn test_form_only_request_body_is_dropped() {
        let yaml = r#"
openapi: "3.0.0"
info:
  title: Forms
  version: "1"
paths:
  /upload:
    post:
      requestBody:
        content:
          multipart/form-data:
            schema:
              type: object
              properties:
                prompt:
                  type: string
  /any:
    post:
      requestBody:
        content:
          "*/*":
            schema:
              type: object
"#;
        let raw: RawOpenApiSpec = serde_yaml::from_str(yaml).unwrap();
        let ops = OperationExtractor::extract(&raw).unwrap();

        let upload = ops.iter().find(|op| op.path == "/upload").unwrap();
        assert!(upload.request_body.is_none());

        let any = ops.iter().find(|op| op.path == "/any").unwrap();
        assert_eq!(any.request_body.as_ref().unwrap().content_type, "*/*");
    }
}
