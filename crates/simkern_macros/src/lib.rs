// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

mod target;

struct TargetCapability {
    enable: String,
}

impl syn::parse::Parse for TargetCapability {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let _: syn::Ident = input.parse()?;
        let _: syn::Token![=] = input.parse()?;
        let enable: syn::LitStr = input.parse()?;
        Ok(Self {
            enable: enable.value(),
        })
    }
}

/// Expands `#[target_capability(enable = "avx2")]` into the
/// `#[target_feature]` attributes a kernel of that tier is compiled with.
#[proc_macro_attribute]
pub fn target_capability(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = syn::parse_macro_input!(attr as TargetCapability);
    let mut result = quote::quote! {};
    for s in attr.enable.split(',') {
        let Some(target_capability) = target::TARGET_CAPABILITIES
            .iter()
            .find(|target_capability| target_capability.name == s)
        else {
            return syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("unknown capability `{s}`"),
            )
            .to_compile_error()
            .into();
        };
        let target_features = target_capability.target_features;
        result.extend(quote::quote!(
            #(#[target_feature(enable = #target_features)])*
        ));
    }
    result.extend(proc_macro2::TokenStream::from(item));
    result.into()
}

#[proc_macro]
pub fn define_is_capability_detected(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let target_arch = syn::parse_macro_input!(input as syn::LitStr).value();
    let mut arms = quote::quote! {};
    for target_capability in target::TARGET_CAPABILITIES {
        if target_capability.target_arch != target_arch {
            continue;
        }
        let name = target_capability.name;
        let flag = syn::Ident::new(target_capability.flag, proc_macro2::Span::mixed_site());
        arms.extend(quote::quote! {
            (#name) => {
                $crate::detect_capabilities().contains($crate::Capability::#flag)
            };
        });
    }
    let ident = syn::Ident::new(
        &format!("is_{target_arch}_capability_detected"),
        proc_macro2::Span::mixed_site(),
    );
    quote::quote! {
        #[macro_export]
        macro_rules! #ident {
            #arms
        }
    }
    .into()
}
