use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct RefreshIndicatorProps {
    pub refreshing: bool,
    pub realtime: bool,
}

#[function_component(RefreshIndicator)]
pub fn refresh_indicator(p: &RefreshIndicatorProps) -> Html {
    let status = match p.realtime {
        true => "Live",
        false => "Checking for new comments every few seconds",
    };
    html! {
        <div class="d-flex align-items-center small text-muted">
            <div
                class={ classes!(
                    "spinner-border", "spinner-border-sm", "m-2",
                    (!p.refreshing).then(|| "invisible")
                ) }
                role="status"
                aria-hidden={ if p.refreshing { "false" } else { "true" } }
            ></div>
            <div>{ status }</div>
        </div>
    }
}
